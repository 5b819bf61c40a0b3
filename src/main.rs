use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triageshift::{
  adapters::http::{AuthRouteDependencies, configure_auth_routes, configure_health_routes},
  application::events::OnUserSignupHandler,
  domain::auth::{AuthService, USER_SIGNUP_EVENT, ports::UserRepository},
  domain::events::{EventStore, HandlerRegistry},
  infrastructure::{
    config::{Config, DatabaseConfig},
    events::{EventPipeline, PipelineConfig},
    notifications::LoggingNotifier,
    persistence::{
      memory::{InMemoryEventRepository, InMemoryUserRepository},
      postgres::{PostgresEventRepository, PostgresUserRepository},
    },
    security::{Argon2PasswordHasher, JwtTokenService},
  },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "triageshift=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting TriageShift");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  let (user_repo, event_store): (Arc<dyn UserRepository>, Arc<dyn EventStore>) =
    match &config.database {
      Some(database) => {
        let pool = connect_database(database).await?;
        (
          Arc::new(PostgresUserRepository::new(pool.clone())),
          Arc::new(PostgresEventRepository::new(pool)),
        )
      }
      None => {
        tracing::warn!("No database configured, users and events are kept in memory");
        (
          Arc::new(InMemoryUserRepository::new()),
          Arc::new(InMemoryEventRepository::new()),
        )
      }
    };

  // Event pipeline with the signup handler
  let notifier = Arc::new(LoggingNotifier::new(
    config.notifications.from_address.clone(),
  ));
  let registry = HandlerRegistry::new().register(
    USER_SIGNUP_EVENT,
    Arc::new(OnUserSignupHandler::new(user_repo.clone(), notifier)),
  );
  let pipeline = Arc::new(EventPipeline::new(
    event_store,
    registry,
    PipelineConfig::from(&config.pipeline),
  ));
  pipeline.spawn_workers();
  pipeline
    .recover()
    .await
    .context("Failed to re-enqueue unfinished events")?;

  let password_hasher =
    Argon2PasswordHasher::new().context("Failed to initialize password hasher")?;
  let token_service = JwtTokenService::new(
    config.security.jwt_secret.as_bytes(),
    config.security.token_ttl_seconds,
  );

  let auth_service = Arc::new(AuthService::new(
    user_repo,
    Arc::new(password_hasher),
    Arc::new(token_service),
    pipeline,
    config.security.auth_service_config(),
  ));

  let routes = AuthRouteDependencies::new(auth_service);

  let server_host = config.server.host.clone();
  let server_port = config.server.port;
  tracing::info!("Listening on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    let routes = routes.clone();
    App::new()
      .wrap(Logger::default())
      .configure(configure_health_routes)
      .service(web::scope("/api/auth").configure(move |cfg| configure_auth_routes(cfg, routes)))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await?;

  Ok(())
}

/// Connects to PostgreSQL and applies pending migrations
async fn connect_database(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
  tracing::info!("Connecting to database");

  let pool = tokio::time::timeout(
    Duration::from_secs(database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(database.max_connections)
      .acquire_timeout(Duration::from_secs(database.acquire_timeout_seconds))
      .connect(&database.url),
  )
  .await
  .with_context(|| {
    format!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      database.connect_timeout_seconds
    )
  })?
  .context("Failed to connect to database")?;

  tracing::info!("Database connection pool created");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  Ok(pool)
}
