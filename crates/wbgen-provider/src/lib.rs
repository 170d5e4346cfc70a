//! Client for the external image and video generation API.
//!
//! The client turns HTTP outcomes into the pre-classified
//! [`ProviderError`](wbgen_core::traits::provider::ProviderError) variants
//! the task executor retries on, so transport details never leak upward.

pub mod classify;
pub mod client;
pub mod prompt;

pub use client::HttpGenerationProvider;
