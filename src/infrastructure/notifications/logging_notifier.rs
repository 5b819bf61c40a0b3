use async_trait::async_trait;
use validator::ValidateEmail;

use crate::domain::events::{Notifier, NotifierError};

/// Notifier that writes outgoing messages to the log instead of a mail relay.
/// Used when no delivery transport is configured.
pub struct LoggingNotifier {
  from_address: String,
}

impl LoggingNotifier {
  pub fn new(from_address: impl Into<String>) -> Self {
    Self {
      from_address: from_address.into(),
    }
  }
}

#[async_trait]
impl Notifier for LoggingNotifier {
  async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifierError> {
    if !to.validate_email() {
      return Err(NotifierError::InvalidRecipient(to.to_string()));
    }

    tracing::info!(
      from = %self.from_address,
      to,
      subject,
      body_len = body.len(),
      "Notification sent"
    );
    tracing::debug!("Notification body:\n{}", body);

    Ok(())
  }
}
