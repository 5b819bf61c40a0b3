use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use std::fmt;

use crate::domain::auth::errors::{AuthError, RepositoryError};

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug)]
pub enum ApiError {
  /// Validation error (400 Bad Request)
  Validation(String),

  /// Authentication or authorization error (401, 403, 404 or 409)
  Auth(AuthErrorKind),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

/// Authentication error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
  /// Unknown email or wrong password (401)
  InvalidCredentials,

  /// No bearer token on the request (401)
  Unauthorized,

  /// Token malformed, expired or badly signed (401)
  InvalidToken,

  /// Caller is authenticated but not an admin (403)
  Forbidden,

  /// Email already exists (409)
  EmailAlreadyExists,

  /// User not found (404)
  UserNotFound,
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::Auth(kind) => write!(f, "Authentication error: {:?}", kind),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Auth(kind) => match kind {
        AuthErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthErrorKind::Forbidden => StatusCode::FORBIDDEN,
        AuthErrorKind::EmailAlreadyExists => StatusCode::CONFLICT,
        AuthErrorKind::UserNotFound => StatusCode::NOT_FOUND,
      },
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let (error_type, message) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone()),
      ApiError::Auth(kind) => match kind {
        AuthErrorKind::InvalidCredentials => (
          "invalid_credentials",
          "Invalid email or password".to_string(),
        ),
        AuthErrorKind::Unauthorized => (
          "unauthorized",
          "Authorization token required".to_string(),
        ),
        AuthErrorKind::InvalidToken => (
          "invalid_token",
          "Invalid authorization token".to_string(),
        ),
        AuthErrorKind::Forbidden => ("forbidden", "Admin role required".to_string()),
        AuthErrorKind::EmailAlreadyExists => (
          "email_already_exists",
          "An account with this email already exists".to_string(),
        ),
        AuthErrorKind::UserNotFound => ("user_not_found", "User not found".to_string()),
      },
      ApiError::Internal(msg) => {
        // Details stay in the log
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
        )
      }
    };

    HttpResponse::build(self.status_code())
      .content_type(ContentType::json())
      .json(ErrorResponse {
        error: error_type.to_string(),
        message,
      })
  }
}

impl From<AuthError> for ApiError {
  fn from(error: AuthError) -> Self {
    match error {
      AuthError::InvalidCredentials => ApiError::Auth(AuthErrorKind::InvalidCredentials),
      AuthError::EmailAlreadyExists => ApiError::Auth(AuthErrorKind::EmailAlreadyExists),
      AuthError::UserNotFound => ApiError::Auth(AuthErrorKind::UserNotFound),
      AuthError::Unauthorized => ApiError::Auth(AuthErrorKind::Unauthorized),
      AuthError::InvalidToken => ApiError::Auth(AuthErrorKind::InvalidToken),
      AuthError::Forbidden => ApiError::Auth(AuthErrorKind::Forbidden),
      AuthError::Validation(err) => ApiError::Validation(err.to_string()),
      AuthError::ValueObject(err) => ApiError::Validation(err.to_string()),
      AuthError::Repository(err) => match err {
        RepositoryError::NotFound => ApiError::Auth(AuthErrorKind::UserNotFound),
        RepositoryError::DuplicateKey(_) => ApiError::Auth(AuthErrorKind::EmailAlreadyExists),
        _ => ApiError::Internal(err.to_string()),
      },
      AuthError::Hash(err) => ApiError::Internal(err.to_string()),
      AuthError::Encoding(msg) => ApiError::Internal(msg),
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors.iter().map(move |error| {
          error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid field: {}", field))
        })
      })
      .collect();
    messages.sort();

    ApiError::Validation(messages.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::auth::errors::ValidationError;

  #[test]
  fn test_auth_error_status_codes() {
    let cases = [
      (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
      (AuthError::UserNotFound, StatusCode::NOT_FOUND),
      (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
      (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
      (AuthError::Forbidden, StatusCode::FORBIDDEN),
      (AuthError::EmailAlreadyExists, StatusCode::CONFLICT),
      (
        AuthError::Validation(ValidationError::PasswordTooShort { min: 8 }),
        StatusCode::BAD_REQUEST,
      ),
      (
        AuthError::Repository(RepositoryError::QueryFailed("boom".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];

    for (error, status) in cases {
      let api_error = ApiError::from(error);
      assert_eq!(api_error.status_code(), status, "{}", api_error);
    }
  }

  #[actix_web::test]
  async fn test_internal_details_are_not_exposed() {
    let response = ApiError::Internal("password=hunter2".to_string()).error_response();
    let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("internal_error"));
    assert!(!body.contains("hunter2"));
  }
}
