//! # auth-adapters
//!
//! [`IdentityResolver`](domains::IdentityResolver) implementations. Hushpost
//! never issues credentials itself; it only verifies the bearer value that an
//! upstream account service handed to the client.
//!
//! - [`GatewayIdentityResolver`]: the bearer value *is* the user id, asserted
//!   by a trusted gateway in front of the API.
//! - [`JwtIdentityResolver`]: HS256 tokens (feature `auth-jwt`).

mod gateway;
#[cfg(feature = "auth-jwt")]
mod jwt;

pub use gateway::GatewayIdentityResolver;
#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityResolver};
