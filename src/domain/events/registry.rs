use std::collections::HashMap;
use std::sync::Arc;

use super::ports::EventHandler;

/// Maps event names to their single handler
#[derive(Default, Clone)]
pub struct HandlerRegistry {
  handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `handler` for `event_name`, replacing any previous one
  pub fn register(mut self, event_name: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
    let event_name = event_name.into();
    if self.handlers.insert(event_name.clone(), handler).is_some() {
      tracing::warn!(event_name = %event_name, "Replaced existing event handler");
    }
    self
  }

  pub fn get(&self, event_name: &str) -> Option<Arc<dyn EventHandler>> {
    self.handlers.get(event_name).cloned()
  }

  pub fn event_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}
