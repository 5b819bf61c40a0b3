use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::{EventError, HandlerError};

/// Event payload: a JSON object
pub type EventData = Map<String, Value>;

/// Lifecycle state of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
  Pending,
  Running,
  Succeeded,
  FailedRetriable,
  FailedTerminal,
}

impl EventStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      EventStatus::Pending => "pending",
      EventStatus::Running => "running",
      EventStatus::Succeeded => "succeeded",
      EventStatus::FailedRetriable => "failed_retriable",
      EventStatus::FailedTerminal => "failed_terminal",
    }
  }

  /// No further transitions happen from a terminal state
  pub fn is_terminal(&self) -> bool {
    matches!(self, EventStatus::Succeeded | EventStatus::FailedTerminal)
  }
}

impl fmt::Display for EventStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EventStatus {
  type Err = EventError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(EventStatus::Pending),
      "running" => Ok(EventStatus::Running),
      "succeeded" => Ok(EventStatus::Succeeded),
      "failed_retriable" => Ok(EventStatus::FailedRetriable),
      "failed_terminal" => Ok(EventStatus::FailedTerminal),
      other => Err(EventError::Store(format!("unknown event status: {}", other))),
    }
  }
}

/// A named event and its delivery state. The pipeline owns every transition;
/// handlers only report an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id: Uuid,
  pub name: String,
  pub data: EventData,
  /// Number of attempts started so far
  pub attempts: u32,
  pub status: EventStatus,
  /// Recorded outputs of completed sub-steps, by step name
  pub steps: BTreeMap<String, Value>,
  pub last_error: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Event {
  pub fn new(name: impl Into<String>, data: EventData) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      data,
      attempts: 0,
      status: EventStatus::Pending,
      steps: BTreeMap::new(),
      last_error: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// pending -> running. Counts the attempt.
  pub fn start(&mut self) -> Result<(), EventError> {
    if self.status != EventStatus::Pending {
      return Err(EventError::InvalidTransition {
        from: self.status,
        to: EventStatus::Running,
      });
    }
    self.attempts += 1;
    self.transition(EventStatus::Running);
    Ok(())
  }

  pub fn succeed(&mut self) {
    self.last_error = None;
    self.transition(EventStatus::Succeeded);
  }

  /// Records a handler failure and returns the resulting status.
  ///
  /// A terminal failure ends the event. A retriable one leaves it
  /// `FailedRetriable` while attempts remain (`attempts <= max_retries`),
  /// otherwise `FailedTerminal`.
  pub fn fail(&mut self, error: &HandlerError, max_retries: u32) -> EventStatus {
    self.last_error = Some(error.to_string());

    let next = match error {
      HandlerError::Terminal(_) => EventStatus::FailedTerminal,
      HandlerError::Retriable(_) if self.attempts <= max_retries => EventStatus::FailedRetriable,
      HandlerError::Retriable(_) => EventStatus::FailedTerminal,
    };
    self.transition(next);
    next
  }

  /// failed-retriable -> pending
  pub fn requeue(&mut self) -> Result<(), EventError> {
    if self.status != EventStatus::FailedRetriable {
      return Err(EventError::InvalidTransition {
        from: self.status,
        to: EventStatus::Pending,
      });
    }
    self.transition(EventStatus::Pending);
    Ok(())
  }

  /// Puts an event interrupted mid-run (process crash) back in the queue
  pub fn recover(&mut self) {
    if matches!(
      self.status,
      EventStatus::Running | EventStatus::FailedRetriable
    ) {
      self.transition(EventStatus::Pending);
    }
  }

  /// Reads a string field of the payload
  pub fn data_str(&self, key: &str) -> Option<&str> {
    self.data.get(key).and_then(Value::as_str)
  }

  fn transition(&mut self, status: EventStatus) {
    self.status = status;
    self.updated_at = Utc::now();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn event() -> Event {
    let data = json!({ "email": "a@example.com" })
      .as_object()
      .cloned()
      .unwrap();
    Event::new("user/signup", data)
  }

  #[test]
  fn test_new_event_is_pending() {
    let event = event();
    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.attempts, 0);
    assert_eq!(event.data_str("email"), Some("a@example.com"));
    assert_eq!(event.data_str("missing"), None);
  }

  #[test]
  fn test_success_path() {
    let mut event = event();
    event.start().unwrap();
    assert_eq!(event.status, EventStatus::Running);
    assert_eq!(event.attempts, 1);

    event.succeed();
    assert!(event.status.is_terminal());
  }

  #[test]
  fn test_start_requires_pending() {
    let mut event = event();
    event.start().unwrap();
    assert!(event.start().is_err());
  }

  #[test]
  fn test_terminal_failure_stops_immediately() {
    let mut event = event();
    event.start().unwrap();

    let status = event.fail(&HandlerError::terminal("gone"), 2);

    assert_eq!(status, EventStatus::FailedTerminal);
    assert!(event.requeue().is_err());
    assert!(event.last_error.as_deref().unwrap().contains("gone"));
  }

  #[test]
  fn test_retriable_failure_exhausts_budget() {
    let mut event = event();
    let mut statuses = Vec::new();

    loop {
      event.start().unwrap();
      let status = event.fail(&HandlerError::retriable("smtp down"), 2);
      statuses.push(status);
      if status.is_terminal() {
        break;
      }
      event.requeue().unwrap();
    }

    assert_eq!(event.attempts, 3);
    assert_eq!(
      statuses,
      vec![
        EventStatus::FailedRetriable,
        EventStatus::FailedRetriable,
        EventStatus::FailedTerminal
      ]
    );
  }

  #[test]
  fn test_zero_retries_means_one_attempt() {
    let mut event = event();
    event.start().unwrap();
    assert_eq!(
      event.fail(&HandlerError::retriable("x"), 0),
      EventStatus::FailedTerminal
    );
  }

  #[test]
  fn test_recover_running_event() {
    let mut event = event();
    event.start().unwrap();
    event.recover();
    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.attempts, 1);
  }
}
