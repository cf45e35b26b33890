//! # api-adapters
//!
//! HTTP surface of Hushpost. The axum router, its extractors and the
//! `DomainError` → status mapping live behind the `web-axum` feature; the
//! metrics registry is framework-agnostic.

pub mod metrics;

#[cfg(feature = "web-axum")]
mod error;
#[cfg(feature = "web-axum")]
mod extract;
#[cfg(feature = "web-axum")]
mod handlers;
#[cfg(feature = "web-axum")]
mod routes;
#[cfg(feature = "web-axum")]
mod state;

pub use metrics::{ApiMetrics, WriteOp};

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, Paging};
