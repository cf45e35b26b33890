//! End-to-end tests for Hushpost live in `tests/`. They drive the full axum
//! router over the in-memory store with gateway identities, so any bearer
//! value is a user id.
