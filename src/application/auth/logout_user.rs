use std::sync::Arc;

use crate::domain::auth::entities::Identity;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::services::AuthService;

/// Use case for logging out.
///
/// Tokens are stateless and nothing is revoked server-side; logging out only
/// confirms the presented token is still valid. The client discards it.
pub struct LogoutUserUseCase {
  auth_service: Arc<AuthService>,
}

impl LogoutUserUseCase {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }

  /// # Errors
  /// Returns `AuthError::InvalidToken` if the token does not verify
  pub fn execute(&self, token: &str) -> Result<Identity, AuthError> {
    let identity = self.auth_service.verify_token(token)?;
    tracing::info!(user_id = %identity.user_id, "User logged out");
    Ok(identity)
  }
}
