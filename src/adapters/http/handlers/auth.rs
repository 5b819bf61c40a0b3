use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use crate::adapters::http::{
  dtos::{AuthResponse, LoginRequest, MessageResponse, SignUpRequest},
  errors::ApiError,
  middleware::bearer_token,
};
use crate::application::auth::{
  LogoutUserUseCase, SignInUserCommand, SignInUserUseCase, SignUpUserCommand, SignUpUserUseCase,
};
use crate::domain::auth::AuthError;

/// Handler for signing up
///
/// POST /api/auth/signup
/// Body: SignUpRequest (JSON)
/// Response: AuthResponse (JSON) with status 200
pub async fn signup_handler(
  request: web::Json<SignUpRequest>,
  use_case: web::Data<Arc<SignUpUserUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let session = use_case
    .execute(SignUpUserCommand {
      email: request.email,
      password: request.password,
      specialties: request.specialties,
    })
    .await?;

  Ok(HttpResponse::Ok().json(AuthResponse {
    user: session.user,
    token: session.token,
  }))
}

/// Handler for signing in
///
/// POST /api/auth/login
/// Body: LoginRequest (JSON)
/// Response: AuthResponse (JSON) with status 200, 401 for any bad credentials
pub async fn login_handler(
  request: web::Json<LoginRequest>,
  use_case: web::Data<Arc<SignInUserUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let request = request.into_inner();
  let session = use_case
    .execute(SignInUserCommand {
      email: request.email,
      password: request.password,
    })
    .await?;

  Ok(HttpResponse::Ok().json(AuthResponse {
    user: session.user,
    token: session.token,
  }))
}

/// Handler for logging out
///
/// POST /api/auth/logout
/// Headers: Authorization: Bearer <token>
/// Response: MessageResponse (JSON) with status 200, 401 if the token does not verify
pub async fn logout_handler(
  use_case: web::Data<Arc<LogoutUserUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let token = bearer_token(http_req.headers()).ok_or(AuthError::Unauthorized)?;

  use_case.execute(token)?;

  Ok(HttpResponse::Ok().json(MessageResponse {
    message: "Successfully logged out".to_string(),
  }))
}
