use std::sync::Arc;

use crate::domain::auth::entities::{Identity, UserView};
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::services::AuthService;

/// Use case for listing every user. Admin only.
pub struct ListUsersUseCase {
  auth_service: Arc<AuthService>,
}

impl ListUsersUseCase {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }

  pub async fn execute(&self, caller: Identity) -> Result<Vec<UserView>, AuthError> {
    self.auth_service.list_users(caller.role).await
  }
}
