pub mod event_repository;
pub mod user_repository;

pub use event_repository::PostgresEventRepository;
pub use user_repository::PostgresUserRepository;
