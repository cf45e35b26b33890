//! # Handlers
//!
//! Thin adapters between HTTP and the services: extract, call, shape the
//! response. Business rules live in `services`.

pub mod comments;
pub mod posts;
pub mod reactions;
pub mod reports;
pub mod system;
