//! Notification endpoints.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use wbgen_core::error::AppError;
use wbgen_core::types::id::NotificationId;
use wbgen_entity::notification::Notification;

use crate::dto::response::{map_page, ApiResponse, CountResponse, NotificationView};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .notifications
        .list(auth.user_id, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(
        map_page::<Notification, NotificationView>(page),
    )))
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.notifications.unread_count(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// `POST /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.notifications.mark_read(id, auth.user_id).await?;
    if !updated {
        return Err(AppError::not_found(format!("Notification not found: {id}")).into());
    }
    Ok(Json(ApiResponse::ok(serde_json::json!({ "read": true }))))
}
