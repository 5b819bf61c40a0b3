use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::auth::{
  entities::User,
  errors::{AuthError, RepositoryError},
  ports::UserRepository,
  value_objects::{Email, Role},
};

/// PostgreSQL implementation of the UserRepository trait
pub struct PostgresUserRepository {
  pool: PgPool,
}

impl PostgresUserRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

/// Database row structure for users table
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
  id: Uuid,
  email: String,
  password_hash: String,
  role: String,
  specialties: Vec<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
  type Error = AuthError;

  fn try_from(row: UserRow) -> Result<Self, Self::Error> {
    let role: Role = row.role.parse().map_err(|_| {
      AuthError::Repository(RepositoryError::CorruptRecord(format!(
        "user {} has role {:?}",
        row.id, row.role
      )))
    })?;

    Ok(User::from_db(
      row.id,
      row.email,
      row.password_hash,
      role,
      row.specialties.into_iter().collect(),
      row.created_at,
      row.updated_at,
    ))
  }
}

const USER_COLUMNS: &str = "id, email, password_hash, role, specialties, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresUserRepository {
  async fn create(&self, user: User) -> Result<User, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
      r#"
            INSERT INTO users (id, email, password_hash, role, specialties, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
    ))
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.specialties.iter().cloned().collect::<Vec<String>>())
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(&self.pool)
    .await?;

    row.try_into()
  }

  async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
      "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email.as_str())
    .fetch_optional(&self.pool)
    .await?;

    row.map(User::try_from).transpose()
  }

  async fn update(&self, user: User) -> Result<User, AuthError> {
    let result = sqlx::query_as::<_, UserRow>(&format!(
      r#"
            UPDATE users
            SET role = $2, specialties = $3, updated_at = $4
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
    ))
    .bind(user.id)
    .bind(user.role.as_str())
    .bind(user.specialties.iter().cloned().collect::<Vec<String>>())
    .bind(user.updated_at)
    .fetch_one(&self.pool)
    .await;

    match result {
      Ok(row) => row.try_into(),
      Err(sqlx::Error::RowNotFound) => Err(AuthError::Repository(RepositoryError::NotFound)),
      Err(e) => Err(e.into()),
    }
  }

  async fn list(&self) -> Result<Vec<User>, AuthError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
      "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email"
    ))
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(User::try_from).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use sqlx::postgres::PgPoolOptions;
  use std::collections::BTreeSet;
  use testcontainers::ImageExt;
  use testcontainers_modules::postgres::Postgres;
  use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};

  async fn setup_test_db() -> (PgPool, ContainerAsync<Postgres>) {
    let container = Postgres::default()
      .with_tag("16-alpine")
      .start()
      .await
      .expect("Failed to start postgres container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
      .get_host_port_ipv4(5432)
      .await
      .expect("Failed to get port");
    let database_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
      .max_connections(5)
      .connect(&database_url)
      .await
      .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .expect("Failed to run migrations");

    (pool, container)
  }

  fn user(email: &str) -> User {
    User::new(
      email.to_string(),
      "$argon2id$v=19$m=16,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
      BTreeSet::from(["pediatrics".to_string()]),
    )
  }

  #[tokio::test]
  async fn test_create_and_find_user() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool);

    let created = repo.create(user("find@example.com")).await.unwrap();
    assert_eq!(created.role, Role::Standard);

    let email = Email::new("FIND@example.com").unwrap();
    let found = repo.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert!(found.specialties.contains("pediatrics"));
  }

  #[tokio::test]
  async fn test_duplicate_email() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool);

    repo.create(user("duplicate@example.com")).await.unwrap();
    let result = repo.create(user("duplicate@example.com")).await;

    match result.unwrap_err() {
      AuthError::Repository(RepositoryError::DuplicateKey(_)) => {}
      other => panic!("Expected Repository(DuplicateKey) error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_update_user() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool);

    let mut created = repo.create(user("update@example.com")).await.unwrap();
    created.role = Role::Admin;
    created.specialties.clear();

    let updated = repo.update(created).await.unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert!(updated.specialties.is_empty());

    let missing = repo.update(user("ghost@example.com")).await;
    assert!(matches!(
      missing,
      Err(AuthError::Repository(RepositoryError::NotFound))
    ));
  }

  #[tokio::test]
  async fn test_list_users() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool);

    repo.create(user("one@example.com")).await.unwrap();
    repo.create(user("two@example.com")).await.unwrap();

    let users = repo.list().await.unwrap();
    assert_eq!(users.len(), 2);
  }
}
