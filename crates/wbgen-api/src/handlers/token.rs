//! Token balance and ledger history endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::dto::response::{ApiResponse, BalanceResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// `GET /api/tokens/balance`
pub async fn balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.ledger.balance(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(BalanceResponse { balance })))
}

/// `GET /api/tokens/history`
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .ledger
        .history(auth.user_id, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
