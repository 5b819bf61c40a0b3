pub mod config;
pub mod events;
pub mod notifications;
pub mod persistence;
pub mod security;
