use std::sync::Arc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::services::{AuthService, AuthSession};
use crate::domain::auth::value_objects::{Email, Password};

/// Command for signing in
#[derive(Debug, Clone)]
pub struct SignInUserCommand {
  pub email: String,
  pub password: String,
}

/// Use case for signing in a user.
///
/// Every failure to authenticate is reported as
/// `AuthError::InvalidCredentials`, so callers cannot tell an unknown email
/// from a wrong password. The actual reason is logged at debug level.
pub struct SignInUserUseCase {
  auth_service: Arc<AuthService>,
}

impl SignInUserUseCase {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }

  pub async fn execute(&self, command: SignInUserCommand) -> Result<AuthSession, AuthError> {
    let (email, password) = match (Email::new(command.email), Password::new(command.password)) {
      (Ok(email), Ok(password)) => (email, password),
      (Err(e), _) | (_, Err(e)) => {
        tracing::debug!("Sign-in rejected, unusable input: {}", e);
        return Err(AuthError::InvalidCredentials);
      }
    };

    match self.auth_service.sign_in(email, password).await {
      Ok(session) => {
        tracing::info!(user_id = %session.user.id, "User signed in");
        Ok(session)
      }
      Err(AuthError::UserNotFound) => {
        tracing::debug!("Sign-in rejected, no such user");
        Err(AuthError::InvalidCredentials)
      }
      Err(AuthError::InvalidCredentials) => {
        tracing::debug!("Sign-in rejected, wrong password");
        Err(AuthError::InvalidCredentials)
      }
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::auth::{SignUpUserCommand, SignUpUserUseCase};
  use crate::application::test_support::auth_service;

  async fn signed_up_service() -> Arc<AuthService> {
    let (service, _repo) = auth_service();
    SignUpUserUseCase::new(service.clone())
      .execute(SignUpUserCommand {
        email: "nurse@example.com".to_string(),
        password: "correct horse".to_string(),
        specialties: vec![],
      })
      .await
      .unwrap();
    service
  }

  fn command(email: &str, password: &str) -> SignInUserCommand {
    SignInUserCommand {
      email: email.to_string(),
      password: password.to_string(),
    }
  }

  #[tokio::test]
  async fn test_sign_in_returns_verifiable_token() {
    let service = signed_up_service().await;
    let use_case = SignInUserUseCase::new(service.clone());

    let session = use_case
      .execute(command("Nurse@Example.com", "correct horse"))
      .await
      .unwrap();

    let identity = service.verify_token(&session.token).unwrap();
    assert_eq!(identity.user_id, session.user.id);
  }

  #[tokio::test]
  async fn test_unknown_email_and_wrong_password_look_the_same() {
    let service = signed_up_service().await;
    let use_case = SignInUserUseCase::new(service);

    let unknown = use_case
      .execute(command("nobody@example.com", "correct horse"))
      .await
      .unwrap_err();
    let wrong = use_case
      .execute(command("nurse@example.com", "wrong horse"))
      .await
      .unwrap_err();
    let malformed = use_case.execute(command("nurse", "")).await.unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(malformed, AuthError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
  }
}
