pub mod auth;

pub use auth::{AuthMiddleware, bearer_token};
