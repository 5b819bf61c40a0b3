use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::auth::entities::UserView;

/// Request for signing up
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
  #[validate(email(message = "Invalid email format"))]
  pub email: String,

  /// Length policy is enforced by the auth service
  #[validate(length(min = 1, message = "Password is required"))]
  pub password: String,

  #[serde(default, alias = "specialities")]
  pub specialties: Vec<String>,
}

/// Request for signing in. Not validated here: malformed input is reported
/// like any other failed sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

/// Request for changing a user's role or specialties
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
  #[validate(email(message = "Invalid email format"))]
  pub email: String,

  #[serde(default)]
  pub role: Option<String>,

  /// Omitted keeps the current specialties, `[]` clears them
  #[serde(default, alias = "specialities")]
  pub specialties: Option<Vec<String>>,
}

/// Signed-in user and their session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
  pub user: UserView,
  pub token: String,
}

/// Standard success response for operations without data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
  pub message: String,
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,
  /// Human-readable message
  pub message: String,
}
