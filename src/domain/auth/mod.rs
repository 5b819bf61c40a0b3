pub mod authorization;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use authorization::require_admin;
pub use entities::{Identity, User, UserPatch, UserView};
pub use errors::{AuthError, HashError, RepositoryError, ValidationError};
pub use services::{AuthService, AuthServiceConfig, AuthSession, USER_SIGNUP_EVENT};
pub use value_objects::{Email, Password, PasswordHash, Role};
