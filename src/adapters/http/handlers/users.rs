use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use super::get_identity;
use crate::adapters::http::{
  dtos::{MessageResponse, UpdateUserRequest},
  errors::ApiError,
};
use crate::application::auth::{ListUsersUseCase, UpdateUserCommand, UpdateUserUseCase};
use crate::domain::auth::require_admin;

/// Handler for changing a user's role or specialties. Admin only.
///
/// POST /api/auth/update-user
/// Body: UpdateUserRequest (JSON)
/// Response: MessageResponse (JSON) with status 200
pub async fn update_user_handler(
  request: web::Json<UpdateUserRequest>,
  use_case: web::Data<Arc<UpdateUserUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let caller = get_identity(&http_req)?;
  require_admin(caller.role)?;
  request.validate()?;

  let request = request.into_inner();
  let user = use_case
    .execute(
      caller,
      UpdateUserCommand {
        email: request.email,
        role: request.role,
        specialties: request.specialties,
      },
    )
    .await?;

  Ok(HttpResponse::Ok().json(MessageResponse {
    message: format!("User {} updated", user.email),
  }))
}

/// Handler for listing users. Admin only.
///
/// POST /api/auth/users
/// Response: array of users (JSON) with status 200, never with password hashes
pub async fn list_users_handler(
  use_case: web::Data<Arc<ListUsersUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let caller = get_identity(&http_req)?;
  let users = use_case.execute(caller).await?;

  Ok(HttpResponse::Ok().json(users))
}
