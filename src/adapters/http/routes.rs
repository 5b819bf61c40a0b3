use actix_web::web;
use std::sync::Arc;

use crate::application::auth::{
  ListUsersUseCase, LogoutUserUseCase, SignInUserUseCase, SignUpUserUseCase, UpdateUserUseCase,
};
use crate::domain::auth::services::AuthService;

use super::handlers::auth::{login_handler, logout_handler, signup_handler};
use super::handlers::health::health_handler;
use super::handlers::users::{list_users_handler, update_user_handler};
use super::middleware::AuthMiddleware;

/// Use cases behind the auth routes
#[derive(Clone)]
pub struct AuthRouteDependencies {
  pub auth_service: Arc<AuthService>,
  pub sign_up: Arc<SignUpUserUseCase>,
  pub sign_in: Arc<SignInUserUseCase>,
  pub logout: Arc<LogoutUserUseCase>,
  pub update_user: Arc<UpdateUserUseCase>,
  pub list_users: Arc<ListUsersUseCase>,
}

impl AuthRouteDependencies {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self {
      sign_up: Arc::new(SignUpUserUseCase::new(auth_service.clone())),
      sign_in: Arc::new(SignInUserUseCase::new(auth_service.clone())),
      logout: Arc::new(LogoutUserUseCase::new(auth_service.clone())),
      update_user: Arc::new(UpdateUserUseCase::new(auth_service.clone())),
      list_users: Arc::new(ListUsersUseCase::new(auth_service.clone())),
      auth_service,
    }
  }
}

/// Configure authentication routes
///
/// Mounts the endpoints under the provided scope (e.g. `/api/auth`).
///
/// # Routes
///
/// - POST /signup - Create an account and receive a session token
/// - POST /login - Exchange credentials for a session token
/// - POST /logout - Confirm a token; the client discards it
/// - POST /update-user - Change a user's role or specialties (admin, bearer token)
/// - POST /users - List users (admin, bearer token)
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig, deps: AuthRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.sign_up))
    .app_data(web::Data::new(deps.sign_in))
    .app_data(web::Data::new(deps.logout))
    .app_data(web::Data::new(deps.update_user))
    .app_data(web::Data::new(deps.list_users))
    .route("/signup", web::post().to(signup_handler))
    .route("/login", web::post().to(login_handler))
    .route("/logout", web::post().to(logout_handler))
    .service(
      web::resource("/update-user")
        .wrap(AuthMiddleware::new(deps.auth_service.clone()))
        .route(web::post().to(update_user_handler)),
    )
    .service(
      web::resource("/users")
        .wrap(AuthMiddleware::new(deps.auth_service))
        .route(web::post().to(list_users_handler)),
    );
}

/// Configure the liveness probe at `/health`
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/health", web::get().to(health_handler));
}
