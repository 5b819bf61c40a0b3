use thiserror::Error;
use uuid::Uuid;

use super::entities::EventStatus;
use crate::domain::auth::AuthError;

/// Outcome class of a failed handler run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
  /// Retrying cannot help; the event ends after this attempt
  #[error("non-retriable: {0}")]
  Terminal(String),

  /// Transient trouble; the pipeline re-queues within the retry budget
  #[error("{0}")]
  Retriable(String),
}

impl HandlerError {
  pub fn terminal(message: impl Into<String>) -> Self {
    HandlerError::Terminal(message.into())
  }

  pub fn retriable(message: impl Into<String>) -> Self {
    HandlerError::Retriable(message.into())
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, HandlerError::Terminal(_))
  }
}

/// Store lookups failing inside a handler are treated as transient
impl From<AuthError> for HandlerError {
  fn from(error: AuthError) -> Self {
    HandlerError::Retriable(error.to_string())
  }
}

impl From<NotifierError> for HandlerError {
  fn from(error: NotifierError) -> Self {
    HandlerError::Retriable(error.to_string())
  }
}

/// Errors raised by the pipeline itself (never by handlers)
#[derive(Debug, Error)]
pub enum EventError {
  #[error("Event queue is closed")]
  QueueClosed,

  #[error("Event not found: {0}")]
  NotFound(Uuid),

  #[error("Invalid event transition from {from} to {to}")]
  InvalidTransition { from: EventStatus, to: EventStatus },

  #[error("Event store error: {0}")]
  Store(String),
}

impl From<sqlx::Error> for EventError {
  fn from(error: sqlx::Error) -> Self {
    EventError::Store(error.to_string())
  }
}

/// Notification transport failure
#[derive(Debug, Error)]
pub enum NotifierError {
  #[error("Notification delivery failed: {0}")]
  DeliveryFailed(String),

  #[error("Invalid recipient: {0}")]
  InvalidRecipient(String),
}
