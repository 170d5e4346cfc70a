//! Generation provider trait and its error classification.
//!
//! The provider is the one external dependency the task executor blocks on.
//! Its errors are pre-classified into retriable and terminal so the retry
//! logic never inspects transport details.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

/// A single generation request: rendered prompt plus source image bytes.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The fully rendered prompt text.
    pub prompt: String,
    /// Source image payloads, in job order.
    pub source_images: Vec<Bytes>,
}

/// A successfully generated asset.
#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    /// Raw asset bytes returned by the provider.
    pub bytes: Bytes,
    /// MIME type reported by the provider (e.g., `image/png`).
    pub mime_type: String,
}

impl GeneratedAsset {
    /// File extension derived from the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            _ => "png",
        }
    }
}

/// Error from a generation attempt, pre-classified for retry handling.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider is rate limiting or transiently overloaded; retrying
    /// after a delay is expected to succeed.
    #[error("Retriable provider failure: {message}")]
    Retriable {
        /// Human/machine-readable cause.
        message: String,
        /// Provider-suggested delay (`Retry-After`), if any.
        retry_after: Option<Duration>,
    },

    /// The request will never succeed (bad input, quota exhausted).
    #[error("Terminal provider failure: {message}")]
    Terminal {
        /// Human/machine-readable cause.
        message: String,
    },
}

impl ProviderError {
    /// Whether the failure is worth retrying.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Retriable { .. })
    }
}

/// Trait for the external generation API.
#[async_trait]
pub trait GenerationProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Generate one asset from the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAsset, ProviderError>;
}
