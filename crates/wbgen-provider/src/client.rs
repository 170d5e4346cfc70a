//! HTTP client for the generation API.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use wbgen_core::config::provider::ProviderConfig;
use wbgen_core::error::{AppError, ErrorKind};
use wbgen_core::result::AppResult;
use wbgen_core::traits::provider::{
    GeneratedAsset, GenerationProvider, GenerationRequest, ProviderError,
};

use crate::classify;

/// Generation provider speaking the upstream HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGenerationProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpGenerationProvider {
    /// Build a provider from configuration.
    pub fn new(config: &ProviderConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("wbgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    /// Source images, base64-encoded in job order.
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    data: Vec<AssetPayload>,
}

#[derive(Debug, Deserialize)]
struct AssetPayload {
    b64: String,
    #[serde(default = "default_mime")]
    mime_type: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

/// Truncate an upstream error body for logging and error messages.
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((i, _)) => &body[..i],
        None => body,
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedAsset, ProviderError> {
        let body = GenerateBody {
            model: &self.model,
            prompt: &request.prompt,
            images: request
                .source_images
                .iter()
                .map(|image| BASE64.encode(image))
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/v1/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(classify::parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(classify::classify_status(
                status.as_u16(),
                retry_after,
                excerpt(&body),
            ));
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| ProviderError::Retriable {
                message: format!("Malformed provider response: {e}"),
                retry_after: None,
            })?;

        let payload = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Retriable {
                message: "Provider returned an empty result set".to_string(),
                retry_after: None,
            })?;

        let bytes = BASE64
            .decode(payload.b64.as_bytes())
            .map_err(|e| ProviderError::Retriable {
                message: format!("Undecodable asset payload: {e}"),
                retry_after: None,
            })?;

        debug!(bytes = bytes.len(), mime = %payload.mime_type, "Generation succeeded");
        Ok(GeneratedAsset {
            bytes: Bytes::from(bytes),
            mime_type: payload.mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(excerpt(&long).len(), 200);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_response_parsing_defaults_mime() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"data":[{"b64":"aGk="}]}"#).unwrap();
        assert_eq!(parsed.data[0].mime_type, "image/png");
    }
}
