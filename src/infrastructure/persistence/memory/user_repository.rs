use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::auth::{
  entities::User,
  errors::{AuthError, RepositoryError},
  ports::UserRepository,
  value_objects::Email,
};

/// Process-local credential store, used when no database is configured and
/// in tests. The email check and insert happen under one write lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
  users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Removes a user outright. Not part of the credential store contract;
  /// lets tests simulate a record vanishing.
  pub async fn remove_by_email(&self, email: &str) -> Option<User> {
    let mut users = self.users.write().await;
    let id = users
      .values()
      .find(|u| u.email.eq_ignore_ascii_case(email))
      .map(|u| u.id)?;
    users.remove(&id)
  }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
  async fn create(&self, user: User) -> Result<User, AuthError> {
    let mut users = self.users.write().await;

    if users
      .values()
      .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
    {
      return Err(AuthError::Repository(RepositoryError::DuplicateKey(
        "users_email_lower_key".to_string(),
      )));
    }

    if users.contains_key(&user.id) {
      return Err(AuthError::Repository(RepositoryError::DuplicateKey(
        "users_pkey".to_string(),
      )));
    }

    users.insert(user.id, user.clone());
    Ok(user)
  }

  async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
    Ok(
      self
        .users
        .read()
        .await
        .values()
        .find(|u| u.email.eq_ignore_ascii_case(email.as_str()))
        .cloned(),
    )
  }

  async fn update(&self, user: User) -> Result<User, AuthError> {
    let mut users = self.users.write().await;

    match users.get_mut(&user.id) {
      Some(existing) => {
        existing.role = user.role;
        existing.specialties = user.specialties;
        existing.updated_at = user.updated_at;
        Ok(existing.clone())
      }
      None => Err(AuthError::Repository(RepositoryError::NotFound)),
    }
  }

  async fn list(&self) -> Result<Vec<User>, AuthError> {
    let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
    users.sort_by(|a, b| {
      a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.email.cmp(&b.email))
    });
    Ok(users)
  }
}
