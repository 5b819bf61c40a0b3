use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::events::{Event, EventData, EventError, EventStatus, EventStore};

/// PostgreSQL implementation of the EventStore trait
pub struct PostgresEventRepository {
  pool: PgPool,
}

impl PostgresEventRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
  id: Uuid,
  name: String,
  data: Json<EventData>,
  attempts: i32,
  status: String,
  steps: Json<BTreeMap<String, Value>>,
  last_error: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
  type Error = EventError;

  fn try_from(row: EventRow) -> Result<Self, Self::Error> {
    Ok(Event {
      id: row.id,
      name: row.name,
      data: row.data.0,
      attempts: u32::try_from(row.attempts)
        .map_err(|_| EventError::Store(format!("event {} has negative attempts", row.id)))?,
      status: row.status.parse()?,
      steps: row.steps.0,
      last_error: row.last_error,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

const EVENT_COLUMNS: &str =
  "id, name, data, attempts, status, steps, last_error, created_at, updated_at";

#[async_trait]
impl EventStore for PostgresEventRepository {
  async fn insert(&self, event: &Event) -> Result<(), EventError> {
    sqlx::query(
      r#"
            INSERT INTO events (id, name, data, attempts, status, steps, last_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
    )
    .bind(event.id)
    .bind(&event.name)
    .bind(Json(&event.data))
    .bind(event.attempts as i32)
    .bind(event.status.as_str())
    .bind(Json(&event.steps))
    .bind(&event.last_error)
    .bind(event.created_at)
    .bind(event.updated_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn save(&self, event: &Event) -> Result<(), EventError> {
    let result = sqlx::query(
      r#"
            UPDATE events
            SET attempts = $2, status = $3, steps = $4, last_error = $5, updated_at = $6
            WHERE id = $1
            "#,
    )
    .bind(event.id)
    .bind(event.attempts as i32)
    .bind(event.status.as_str())
    .bind(Json(&event.steps))
    .bind(&event.last_error)
    .bind(event.updated_at)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(EventError::NotFound(event.id));
    }

    Ok(())
  }

  async fn find(&self, id: Uuid) -> Result<Option<Event>, EventError> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
      "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.map(Event::try_from).transpose()
  }

  async fn find_by_status(&self, statuses: &[EventStatus]) -> Result<Vec<Event>, EventError> {
    let statuses: Vec<&str> = statuses.iter().map(EventStatus::as_str).collect();

    let rows = sqlx::query_as::<_, EventRow>(&format!(
      "SELECT {EVENT_COLUMNS} FROM events WHERE status = ANY($1) ORDER BY created_at"
    ))
    .bind(statuses)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(Event::try_from).collect()
  }
}
