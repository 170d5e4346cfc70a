//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway injects the verified
//! caller identity as an `x-user-id` header. A request without a valid
//! header never reached us through the gateway, so it is rejected.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use wbgen_core::error::AppError;
use wbgen_core::types::id::UserId;

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The caller's user id.
    pub user_id: UserId,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::forbidden("Missing caller identity"))?;

        let user_id = header
            .parse::<UserId>()
            .map_err(|_| AppError::forbidden("Malformed caller identity"))?;

        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_extracts_user() {
        let id = UserId::new();
        let auth = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(auth.user_id, id);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        assert!(extract(None).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        assert!(extract(Some("not-a-uuid")).await.is_err());
    }
}
