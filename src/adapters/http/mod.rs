pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use dtos::{
  AuthResponse, ErrorResponse, LoginRequest, MessageResponse, SignUpRequest, UpdateUserRequest,
};
pub use errors::{ApiError, AuthErrorKind};
pub use middleware::AuthMiddleware;
pub use routes::{AuthRouteDependencies, configure_auth_routes, configure_health_routes};
