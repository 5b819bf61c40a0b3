pub mod auth;
pub mod health;
pub mod users;

use crate::{
  adapters::http::errors::ApiError,
  domain::auth::{AuthError, entities::Identity},
};
use actix_web::{HttpMessage, HttpRequest};

/// Extract the verified caller from request extensions (set by AuthMiddleware)
pub fn get_identity(req: &HttpRequest) -> Result<Identity, ApiError> {
  let identity = req.extensions().get::<Identity>().copied();

  if identity.is_none() {
    tracing::warn!(
      "get_identity: Identity not found in request extensions for path {}",
      req.path()
    );
  }

  identity.ok_or_else(|| ApiError::from(AuthError::Unauthorized))
}
