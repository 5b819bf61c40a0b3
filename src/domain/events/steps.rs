use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;

use super::errors::HandlerError;

/// Named sub-steps of a handler run.
///
/// A step that completed on an earlier attempt of the same event returns its
/// recorded output instead of running again. Failed steps record nothing.
#[derive(Debug, Default)]
pub struct StepContext {
  completed: BTreeMap<String, Value>,
}

impl StepContext {
  pub fn new(completed: BTreeMap<String, Value>) -> Self {
    Self { completed }
  }

  pub async fn run<T, F, Fut>(&mut self, name: &str, step: F) -> Result<T, HandlerError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, HandlerError>>,
  {
    if let Some(recorded) = self.completed.get(name) {
      match serde_json::from_value(recorded.clone()) {
        Ok(output) => {
          tracing::debug!(step = name, "Step output replayed from memo");
          return Ok(output);
        }
        Err(e) => {
          tracing::warn!(step = name, "Discarding unreadable step memo: {}", e);
          self.completed.remove(name);
        }
      }
    }

    let output = step().await?;

    let recorded = serde_json::to_value(&output).map_err(|e| {
      HandlerError::terminal(format!("step {} output not serializable: {}", name, e))
    })?;
    self.completed.insert(name.to_string(), recorded);

    Ok(output)
  }

  pub fn into_completed(self) -> BTreeMap<String, Value> {
    self.completed
  }
}
