//! # storage-adapters
//!
//! Implementations of the `domains` storage ports.
//!
//! - [`memory::MemoryStore`]: always compiled; used by tests and single-node demos.
//! - [`postgres::PgStore`]: behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
