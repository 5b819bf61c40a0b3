//! Application layer
//!
//! Use cases that orchestrate domain services for the HTTP adapter, and the
//! event handlers registered with the pipeline.

pub mod auth;
pub mod events;

#[cfg(test)]
pub(crate) mod test_support;
