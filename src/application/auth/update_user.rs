use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::auth::authorization::require_admin;
use crate::domain::auth::entities::{Identity, UserPatch, UserView};
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::services::AuthService;
use crate::domain::auth::value_objects::{Email, Role};

/// Command for changing another user's role or specialties
#[derive(Debug, Clone)]
pub struct UpdateUserCommand {
  pub email: String,
  /// `None` keeps the current role
  pub role: Option<String>,
  /// `None` keeps the current set, an empty list clears it
  pub specialties: Option<Vec<String>>,
}

/// Use case for admin-only user updates
pub struct UpdateUserUseCase {
  auth_service: Arc<AuthService>,
}

impl UpdateUserUseCase {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }

  /// # Errors
  /// - `AuthError::Forbidden` if the caller is not an admin
  /// - `AuthError::Validation` for a malformed email or unknown role
  /// - `AuthError::UserNotFound` if no user has this email
  pub async fn execute(
    &self,
    caller: Identity,
    command: UpdateUserCommand,
  ) -> Result<UserView, AuthError> {
    // A non-admin learns nothing about the input
    require_admin(caller.role)?;

    let email = Email::new(command.email).map_err(AuthError::from_input)?;
    let role = command
      .role
      .map(|r| r.parse::<Role>())
      .transpose()
      .map_err(AuthError::from_input)?;

    let patch = UserPatch {
      role,
      specialties: command
        .specialties
        .map(|s| s.into_iter().collect::<BTreeSet<String>>()),
    };

    self
      .auth_service
      .update_user(caller.role, &email, patch)
      .await
  }
}
