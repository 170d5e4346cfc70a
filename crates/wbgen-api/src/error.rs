//! HTTP error responses.
//!
//! [`ApiError`] wraps [`AppError`] so the API crate can map error kinds to
//! status codes without the core crate knowing anything about HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use wbgen_core::error::{AppError, ErrorKind};

/// An [`AppError`] at the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::InsufficientTokens => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Storage
            | ErrorKind::Provider
            | ErrorKind::Configuration
            | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self.0.kind {
            ErrorKind::Validation => "invalid_input",
            ErrorKind::InsufficientTokens => "insufficient_tokens",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs, not in the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(kind = %self.0.kind, error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.message.clone()
        };

        let body = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                AppError::insufficient_tokens("broke"),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (AppError::not_found("gone"), StatusCode::NOT_FOUND),
            (AppError::forbidden("no"), StatusCode::FORBIDDEN),
            (AppError::conflict("dup"), StatusCode::CONFLICT),
            (AppError::database("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::service_unavailable("busy"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError(AppError::database("connection string leaked"));
        assert_eq!(err.code(), "internal_error");
    }
}
