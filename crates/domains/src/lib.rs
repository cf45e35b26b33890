//! hushpost/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for Hushpost.
//! Nothing in here performs I/O; adapters implement the ports.

pub mod errors;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod reaction;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;
pub use reaction::*;
