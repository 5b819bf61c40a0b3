pub mod event_repository;
pub mod user_repository;

pub use event_repository::InMemoryEventRepository;
pub use user_repository::InMemoryUserRepository;
