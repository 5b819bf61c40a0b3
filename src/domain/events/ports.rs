use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{Event, EventData, EventStatus};
use super::errors::{EventError, HandlerError, NotifierError};
use super::steps::StepContext;

/// Producer side of the pipeline
#[async_trait]
pub trait EventEmitter: Send + Sync {
  /// Persists the event as pending and queues it. Returns once enqueued;
  /// never waits for the handler.
  async fn emit(&self, name: &str, data: EventData) -> Result<Uuid, EventError>;
}

/// Consumer side: one handler per event name
#[async_trait]
pub trait EventHandler: Send + Sync {
  async fn handle(&self, event: &Event, steps: &mut StepContext) -> Result<(), HandlerError>;
}

/// Durable record of events and their lifecycle state
#[async_trait]
pub trait EventStore: Send + Sync {
  async fn insert(&self, event: &Event) -> Result<(), EventError>;

  /// Saves the current state of an existing event
  async fn save(&self, event: &Event) -> Result<(), EventError>;

  async fn find(&self, id: Uuid) -> Result<Option<Event>, EventError>;

  async fn find_by_status(&self, statuses: &[EventStatus]) -> Result<Vec<Event>, EventError>;
}

/// Outbound email/notification transport
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifierError>;
}
