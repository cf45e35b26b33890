//! # DomainError
//!
//! Centralized error handling for the Hushpost services.
//! Each variant maps to exactly one HTTP status in the API layer.

use thiserror::Error;

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing, oversized or malformed input, including moderation rejections.
    #[error("{0}")]
    InvalidInput(String),

    /// The named resource does not exist or has been soft-deleted.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller is not the owner of the resource.
    #[error("{0}")]
    Forbidden(String),

    /// No usable caller identity on a route that requires one.
    #[error("{0}")]
    Unauthorized(String),

    /// A concurrent writer changed the record first (e.g. duplicate reaction).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g. DB down). Never shown to clients verbatim.
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        Self::Unexpected(err.to_string())
    }
}

/// A specialized Result type for Hushpost logic.
pub type Result<T> = std::result::Result<T, DomainError>;
