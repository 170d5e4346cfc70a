//! HTTP outcome classification.
//!
//! Rate limiting and upstream overload are retriable; anything that means
//! the request itself is unacceptable is terminal. Classification happens
//! here once so the executor's retry loop stays transport-free.

use std::time::Duration;

use wbgen_core::traits::provider::ProviderError;

/// Classify a non-success HTTP status into a provider error.
pub fn classify_status(
    status: u16,
    retry_after: Option<Duration>,
    body_excerpt: &str,
) -> ProviderError {
    match status {
        429 => ProviderError::Retriable {
            message: format!("Rate limited (429): {body_excerpt}"),
            retry_after,
        },
        500 | 502 | 503 | 504 => ProviderError::Retriable {
            message: format!("Upstream unavailable ({status}): {body_excerpt}"),
            retry_after,
        },
        _ => ProviderError::Terminal {
            message: format!("Generation rejected ({status}): {body_excerpt}"),
        },
    }
}

/// Classify a transport-level failure.
pub fn classify_transport(error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() || error.is_connect() {
        ProviderError::Retriable {
            message: format!("Transport failure: {error}"),
            retry_after: None,
        }
    } else {
        ProviderError::Terminal {
            message: format!("Request failed: {error}"),
        }
    }
}

/// Parse a `Retry-After` header value given in whole seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
