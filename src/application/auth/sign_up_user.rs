use std::sync::Arc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::services::{AuthService, AuthSession};
use crate::domain::auth::value_objects::{Email, Password};

/// Command for signing up a new user
#[derive(Debug, Clone)]
pub struct SignUpUserCommand {
  pub email: String,
  /// Plain text, hashed before it is stored
  pub password: String,
  pub specialties: Vec<String>,
}

/// Use case for signing up a new user
pub struct SignUpUserUseCase {
  auth_service: Arc<AuthService>,
}

impl SignUpUserUseCase {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }

  /// Creates the user and returns it together with a session token
  ///
  /// # Errors
  /// - `AuthError::Validation` for a malformed email or a password outside policy
  /// - `AuthError::EmailAlreadyExists` if the email is taken
  pub async fn execute(&self, command: SignUpUserCommand) -> Result<AuthSession, AuthError> {
    let email = Email::new(command.email).map_err(AuthError::from_input)?;
    let password = Password::new(command.password).map_err(AuthError::from_input)?;

    self
      .auth_service
      .sign_up(email, password, command.specialties.into_iter().collect())
      .await
  }
}
