//! Shared primitives for the storefront workspace.
//!
//! This crate holds the small building blocks every other crate leans on:
//! location-tracked errors, HTTP status helpers and a secret wrapper that
//! keeps credentials out of logs.
//!
//! ## Architecture
//!
//! - **common** (this crate): Error plumbing and value types
//! - **storefront-core**: Session, token and cart logic built on top

pub mod error;
pub mod http_status;
pub mod redacted_token;


pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_token::RedactedToken;
