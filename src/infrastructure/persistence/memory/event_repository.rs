use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::events::{Event, EventError, EventStatus, EventStore};

/// Process-local event store. Events do not survive a restart.
#[derive(Default)]
pub struct InMemoryEventRepository {
  events: RwLock<HashMap<Uuid, Event>>,
}

impl InMemoryEventRepository {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl EventStore for InMemoryEventRepository {
  async fn insert(&self, event: &Event) -> Result<(), EventError> {
    let mut events = self.events.write().await;
    if events.contains_key(&event.id) {
      return Err(EventError::Store(format!("duplicate event id {}", event.id)));
    }
    events.insert(event.id, event.clone());
    Ok(())
  }

  async fn save(&self, event: &Event) -> Result<(), EventError> {
    match self.events.write().await.get_mut(&event.id) {
      Some(stored) => {
        *stored = event.clone();
        Ok(())
      }
      None => Err(EventError::NotFound(event.id)),
    }
  }

  async fn find(&self, id: Uuid) -> Result<Option<Event>, EventError> {
    Ok(self.events.read().await.get(&id).cloned())
  }

  async fn find_by_status(&self, statuses: &[EventStatus]) -> Result<Vec<Event>, EventError> {
    let mut matching: Vec<Event> = self
      .events
      .read()
      .await
      .values()
      .filter(|e| statuses.contains(&e.status))
      .cloned()
      .collect();
    matching.sort_by_key(|e| e.created_at);
    Ok(matching)
  }
}
