use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::events::{
  Event, EventData, EventEmitter, EventError, EventStatus, EventStore, HandlerError,
  HandlerRegistry, StepContext,
};

/// Runtime knobs for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// Retries after the first attempt; total attempts are `max_retries + 1`
  pub max_retries: u32,
  pub workers: usize,
  pub queue_capacity: usize,
  /// Delay before retry `n` is `retry_backoff * n`
  pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      max_retries: 2,
      workers: 1,
      queue_capacity: 1024,
      retry_backoff: Duration::from_millis(1000),
    }
  }
}

/// Lower bound on the pause between retries of a failed store write
const MIN_STORE_RETRY_DELAY: Duration = Duration::from_millis(10);

struct Dispatcher {
  store: Arc<dyn EventStore>,
  registry: HandlerRegistry,
  config: PipelineConfig,
  sender: mpsc::Sender<Uuid>,
}

/// In-process event pipeline.
///
/// `emit` persists the event as pending and pushes its id onto one bounded
/// queue. Worker tasks pull ids off the queue, run the registered handler and
/// save every transition, so an event is delivered at least once even across
/// restarts (see [`EventPipeline::recover`]).
pub struct EventPipeline {
  dispatcher: Arc<Dispatcher>,
  receiver: Arc<Mutex<mpsc::Receiver<Uuid>>>,
}

impl EventPipeline {
  pub fn new(
    store: Arc<dyn EventStore>,
    registry: HandlerRegistry,
    config: PipelineConfig,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));

    Self {
      dispatcher: Arc::new(Dispatcher {
        store,
        registry,
        config,
        sender,
      }),
      receiver: Arc::new(Mutex::new(receiver)),
    }
  }

  /// Starts `config.workers` consumer tasks on the current runtime
  pub fn spawn_workers(&self) -> Vec<JoinHandle<()>> {
    let workers = self.dispatcher.config.workers.max(1);
    tracing::info!(
      workers,
      handlers = ?self.dispatcher.registry.event_names(),
      "Starting event pipeline"
    );

    (0..workers)
      .map(|worker| {
        let dispatcher = Arc::clone(&self.dispatcher);
        let receiver = Arc::clone(&self.receiver);
        tokio::spawn(async move { worker_loop(worker, dispatcher, receiver).await })
      })
      .collect()
  }

  /// Re-enqueues events a previous process left unfinished: pending ones,
  /// ones interrupted while running, and ones waiting out a retry delay.
  /// Returns how many were queued.
  pub async fn recover(&self) -> Result<usize, EventError> {
    let unfinished = self
      .dispatcher
      .store
      .find_by_status(&[
        EventStatus::Pending,
        EventStatus::Running,
        EventStatus::FailedRetriable,
      ])
      .await?;

    let count = unfinished.len();
    for mut event in unfinished {
      if event.status != EventStatus::Pending {
        tracing::warn!(
          event_id = %event.id,
          event_name = %event.name,
          status = %event.status,
          "Recovering interrupted event"
        );
        event.recover();
        self.dispatcher.store.save(&event).await?;
      }
      self.dispatcher.enqueue(event.id).await?;
    }

    if count > 0 {
      tracing::info!(count, "Re-enqueued unfinished events");
    }
    Ok(count)
  }

  /// Current state of an event
  pub async fn status(&self, event_id: Uuid) -> Result<Option<Event>, EventError> {
    self.dispatcher.store.find(event_id).await
  }
}

#[async_trait]
impl EventEmitter for EventPipeline {
  /// Persists the event as pending and queues it without waiting on the
  /// workers
  async fn emit(&self, name: &str, data: EventData) -> Result<Uuid, EventError> {
    let event = Event::new(name, data);
    self.dispatcher.store.insert(&event).await?;
    self.dispatcher.offer(event.id)?;

    tracing::debug!(event_id = %event.id, event_name = name, "Event emitted");
    Ok(event.id)
  }
}

async fn worker_loop(
  worker: usize,
  dispatcher: Arc<Dispatcher>,
  receiver: Arc<Mutex<mpsc::Receiver<Uuid>>>,
) {
  loop {
    let next = receiver.lock().await.recv().await;
    let Some(event_id) = next else {
      tracing::info!(worker, "Event queue closed, worker stopping");
      break;
    };

    match dispatcher.process(event_id).await {
      Ok(()) => {}
      Err(EventError::Store(e)) => {
        tracing::warn!(worker, %event_id, "Event store unavailable, redelivering: {}", e);
        dispatcher.redeliver_later(event_id);
      }
      Err(e) => tracing::error!(worker, %event_id, "Failed to process event: {}", e),
    }
  }
}

impl Dispatcher {
  async fn enqueue(&self, event_id: Uuid) -> Result<(), EventError> {
    self
      .sender
      .send(event_id)
      .await
      .map_err(|_| EventError::QueueClosed)
  }

  /// Queues without waiting. A full queue hands the id to a background send;
  /// the event is already stored as pending either way.
  fn offer(&self, event_id: Uuid) -> Result<(), EventError> {
    match self.sender.try_send(event_id) {
      Ok(()) => Ok(()),
      Err(TrySendError::Full(event_id)) => {
        tracing::debug!(%event_id, "Event queue full, deferring enqueue");
        let sender = self.sender.clone();
        tokio::spawn(async move {
          if sender.send(event_id).await.is_err() {
            tracing::error!(%event_id, "Event queue closed before enqueue");
          }
        });
        Ok(())
      }
      Err(TrySendError::Closed(_)) => Err(EventError::QueueClosed),
    }
  }

  fn store_retry_delay(&self) -> Duration {
    self.config.retry_backoff.max(MIN_STORE_RETRY_DELAY)
  }

  /// Runs one attempt of a queued event
  async fn process(self: &Arc<Self>, event_id: Uuid) -> Result<(), EventError> {
    let mut event = self
      .store
      .find(event_id)
      .await?
      .ok_or(EventError::NotFound(event_id))?;

    // Recovery can queue an id that is already queued; only a pending event runs.
    if event.status != EventStatus::Pending {
      tracing::debug!(%event_id, status = %event.status, "Skipping event that is not pending");
      return Ok(());
    }

    // An attempt interrupted by a crash still counts against the budget
    if event.attempts > self.config.max_retries {
      event.fail(
        &HandlerError::terminal("retry budget exhausted"),
        self.config.max_retries,
      );
      self.store.save(&event).await?;
      tracing::error!(
        event_id = %event.id,
        event_name = %event.name,
        attempts = event.attempts,
        "Event exhausted its retry budget"
      );
      return Ok(());
    }

    event.start()?;
    self.store.save(&event).await?;

    tracing::debug!(
      event_id = %event.id,
      event_name = %event.name,
      attempt = event.attempts,
      "Event started"
    );

    match self.run_handler(&mut event).await {
      Ok(()) => {
        event.succeed();
        tracing::info!(
          event_id = %event.id,
          event_name = %event.name,
          attempt = event.attempts,
          "Event handled"
        );
      }
      Err(error) => {
        if event.fail(&error, self.config.max_retries) == EventStatus::FailedRetriable {
          tracing::warn!(
            event_id = %event.id,
            event_name = %event.name,
            attempt = event.attempts,
            "Event failed, will retry: {}",
            error
          );
        } else {
          tracing::error!(
            event_id = %event.id,
            event_name = %event.name,
            attempt = event.attempts,
            "Event failed permanently: {}",
            error
          );
        }
      }
    }

    if let Err(e) = self.store.save(&event).await {
      tracing::warn!(
        event_id = %event.id,
        status = %event.status,
        "Failed to save event outcome, retrying: {}",
        e
      );
      let dispatcher = Arc::clone(self);
      tokio::spawn(async move {
        if dispatcher.save_until_stored(&event).await
          && event.status == EventStatus::FailedRetriable
        {
          dispatcher.schedule_retry(event);
        }
      });
      return Ok(());
    }

    if event.status == EventStatus::FailedRetriable {
      self.schedule_retry(event);
    }
    Ok(())
  }

  async fn run_handler(&self, event: &mut Event) -> Result<(), HandlerError> {
    let Some(handler) = self.registry.get(&event.name) else {
      return Err(HandlerError::terminal(format!(
        "no handler registered for {}",
        event.name
      )));
    };

    let mut steps = StepContext::new(std::mem::take(&mut event.steps));
    let result = AssertUnwindSafe(handler.handle(event, &mut steps))
      .catch_unwind()
      .await
      .unwrap_or_else(|_| Err(HandlerError::retriable("handler panicked")));
    event.steps = steps.into_completed();

    result
  }

  /// Keeps writing `event` until the store accepts it. Returns `false` if the
  /// event no longer exists in the store.
  async fn save_until_stored(&self, event: &Event) -> bool {
    loop {
      tokio::time::sleep(self.store_retry_delay()).await;
      match self.store.save(event).await {
        Ok(()) => return true,
        Err(EventError::NotFound(id)) => {
          tracing::error!(event_id = %id, "Event vanished from the store");
          return false;
        }
        Err(e) => tracing::warn!(event_id = %event.id, "Event store still failing: {}", e),
      }
    }
  }

  /// Puts an id back on the queue after a store failure left it unprocessed
  fn redeliver_later(self: &Arc<Self>, event_id: Uuid) {
    let delay = self.store_retry_delay();
    let dispatcher = Arc::clone(self);

    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      if let Err(e) = dispatcher.enqueue(event_id).await {
        tracing::error!(%event_id, "Failed to redeliver event: {}", e);
      }
    });
  }

  fn schedule_retry(self: &Arc<Self>, mut event: Event) {
    let delay = self.config.retry_backoff * event.attempts;
    let dispatcher = Arc::clone(self);

    tokio::spawn(async move {
      tokio::time::sleep(delay).await;

      if let Err(e) = event.requeue() {
        tracing::error!(event_id = %event.id, "Cannot requeue event: {}", e);
        return;
      }
      if let Err(e) = dispatcher.store.save(&event).await {
        tracing::warn!(event_id = %event.id, "Failed to save requeued event, retrying: {}", e);
        if !dispatcher.save_until_stored(&event).await {
          return;
        }
      }
      if let Err(e) = dispatcher.enqueue(event.id).await {
        tracing::error!(event_id = %event.id, "Failed to requeue event: {}", e);
      }
    });
  }
}
