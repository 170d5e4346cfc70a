//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider: currently only `"local"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for locally stored assets.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Public base URL under which stored assets are addressable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_data_root() -> String {
    "./data/assets".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/assets".to_string()
}
