use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::auth::ports::UserRepository;
use crate::domain::auth::value_objects::Email;
use crate::domain::events::{Event, EventHandler, HandlerError, Notifier, StepContext};

pub const WELCOME_SUBJECT: &str = "Welcome to TriageShift";
pub const WELCOME_BODY: &str = "Hi,\n\nThanks for signing up. We're glad to have you on board!\n";

/// Handles `user/signup`: re-checks that the user still exists, then sends
/// the welcome notification.
///
/// A user missing at processing time is a terminal failure. Notifier
/// failures are retriable, and the lookup step is not repeated on retry.
pub struct OnUserSignupHandler {
  user_repo: Arc<dyn UserRepository>,
  notifier: Arc<dyn Notifier>,
}

impl OnUserSignupHandler {
  pub fn new(user_repo: Arc<dyn UserRepository>, notifier: Arc<dyn Notifier>) -> Self {
    Self {
      user_repo,
      notifier,
    }
  }
}

#[async_trait]
impl EventHandler for OnUserSignupHandler {
  async fn handle(&self, event: &Event, steps: &mut StepContext) -> Result<(), HandlerError> {
    let email = event
      .data_str("email")
      .ok_or_else(|| HandlerError::terminal("payload has no email"))?;
    let email = Email::new(email).map_err(|e| HandlerError::terminal(e.to_string()))?;

    let address: String = steps
      .run("get-user-email", || async {
        match self.user_repo.find_by_email(&email).await {
          Ok(Some(user)) => Ok(user.email),
          Ok(None) => Err(HandlerError::terminal(format!(
            "user {} no longer exists",
            email.as_str()
          ))),
          Err(e) => Err(HandlerError::from(e)),
        }
      })
      .await?;

    steps
      .run("send-welcome-email", || async {
        self
          .notifier
          .send(&address, WELCOME_SUBJECT, WELCOME_BODY)
          .await
          .map_err(HandlerError::from)
      })
      .await?;

    tracing::info!(event_id = %event.id, "Welcome notification sent");
    Ok(())
  }
}
