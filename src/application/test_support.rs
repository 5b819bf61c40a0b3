use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::auth::{AuthService, AuthServiceConfig};
use crate::domain::events::{Event, EventEmitter, EventStore, HandlerRegistry};
use crate::infrastructure::events::{EventPipeline, PipelineConfig};
use crate::infrastructure::persistence::memory::{InMemoryEventRepository, InMemoryUserRepository};
use crate::infrastructure::security::{Argon2PasswordHasher, JwtTokenService};

pub(crate) const TEST_SECRET: &[u8] = b"test-secret";

/// Auth service over in-memory stores whose events go to a pipeline that
/// has no workers running
pub(crate) fn auth_service() -> (Arc<AuthService>, Arc<InMemoryUserRepository>) {
  let pipeline = EventPipeline::new(
    Arc::new(InMemoryEventRepository::new()),
    HandlerRegistry::new(),
    PipelineConfig::default(),
  );
  let repo = Arc::new(InMemoryUserRepository::new());
  (auth_service_with(repo.clone(), Arc::new(pipeline)), repo)
}

pub(crate) fn auth_service_with(
  repo: Arc<InMemoryUserRepository>,
  events: Arc<dyn EventEmitter>,
) -> Arc<AuthService> {
  Arc::new(AuthService::new(
    repo,
    Arc::new(Argon2PasswordHasher::for_tests()),
    Arc::new(JwtTokenService::new(TEST_SECRET, None)),
    events,
    AuthServiceConfig::default(),
  ))
}

pub(crate) fn pipeline_config() -> PipelineConfig {
  PipelineConfig {
    retry_backoff: Duration::ZERO,
    ..PipelineConfig::default()
  }
}

/// Polls the store until the event reaches a terminal state
pub(crate) async fn wait_until_finished(store: &dyn EventStore, id: Uuid) -> Event {
  for _ in 0..500 {
    if let Some(event) = store.find(id).await.unwrap() {
      if event.status.is_terminal() {
        return event;
      }
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
  }
  panic!("event {} did not finish", id);
}
