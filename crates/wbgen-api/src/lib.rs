//! HTTP API layer for WBGen.
//!
//! Thin handlers over the service crate: extract identity and input,
//! delegate, and shape the response. Authentication itself is handled
//! upstream; the gateway injects the caller identity as a header.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
