use actix_web::{
  Error, HttpMessage, ResponseError,
  body::EitherBody,
  dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
  http::header::{AUTHORIZATION, HeaderMap},
};
use futures_util::future::LocalBoxFuture;
use std::{
  future::{Ready, ready},
  rc::Rc,
  sync::Arc,
};

use crate::{
  adapters::http::errors::ApiError,
  domain::auth::{AuthError, AuthService},
};

/// Authentication middleware that verifies the bearer token and attaches the
/// caller's `Identity` to the request
///
/// Requests without a verifiable token are answered with 401 and never reach
/// the wrapped service.
///
/// # Example
///
/// ```no_run
/// use actix_web::{App, web};
/// use std::sync::Arc;
/// # use triageshift::domain::auth::AuthService;
/// # use triageshift::adapters::http::middleware::auth::AuthMiddleware;
///
/// # async fn example(auth_service: Arc<AuthService>) {
/// let app = App::new().service(
///   web::resource("/users")
///     .wrap(AuthMiddleware::new(auth_service))
///     .route(web::post().to(|| async { "Protected endpoint" })),
/// );
/// # }
/// ```
pub struct AuthMiddleware {
  auth_service: Arc<AuthService>,
}

impl AuthMiddleware {
  pub fn new(auth_service: Arc<AuthService>) -> Self {
    Self { auth_service }
  }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Transform = AuthMiddlewareService<S>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AuthMiddlewareService {
      service: Rc::new(service),
      auth_service: self.auth_service.clone(),
    }))
  }
}

pub struct AuthMiddlewareService<S> {
  service: Rc<S>,
  auth_service: Arc<AuthService>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = Rc::clone(&self.service);
    let auth_service = self.auth_service.clone();

    Box::pin(async move {
      let verified = bearer_token(req.headers())
        .ok_or(AuthError::Unauthorized)
        .and_then(|token| auth_service.verify_token(token))
        .map_err(ApiError::from);

      let identity = match verified {
        Ok(identity) => identity,
        Err(e) => {
          let (request, _) = req.into_parts();
          let response = e.error_response().map_into_right_body();
          return Ok(ServiceResponse::new(request, response));
        }
      };

      req.extensions_mut().insert(identity);

      let res = service.call(req).await?;
      Ok(res.map_into_left_body())
    })
  }
}

/// Token carried by the `Authorization` header: its second
/// whitespace-delimited segment, as in `Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(AUTHORIZATION)
    .and_then(|h| h.to_str().ok())
    .and_then(|s| s.split_whitespace().nth(1))
}
