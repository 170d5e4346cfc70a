//! External generation provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the external image/video generation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the generation API.
    pub base_url: String,
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,
    /// Model identifier requested from the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds (one generation call).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_model() -> String {
    "image-edit-1".to_string()
}

fn default_request_timeout() -> u64 {
    120
}
