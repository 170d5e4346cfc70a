//! Payment webhook endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;
use validator::Validate;

use wbgen_core::error::AppError;

use crate::dto::request::PaymentWebhookRequest;
use crate::dto::response::{ApiResponse, PaymentAckResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/webhooks/payment`
///
/// Called by the payment provider, not by end users; the gateway verifies
/// the delivery signature before it reaches us. Deliveries are at-least-once
/// so the credit is idempotent on the payment id. Always acknowledges with
/// 200 for recognized payloads so the provider stops retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    if !payload.is_succeeded() {
        info!(
            payment_id = %payload.payment_id,
            status = %payload.status,
            "Ignoring non-succeeded payment delivery"
        );
        return Ok(Json(ApiResponse::ok(PaymentAckResponse { credited: false })));
    }

    let credited = state
        .ledger
        .credit_payment(payload.user_id, payload.amount, &payload.payment_id)
        .await?;

    Ok(Json(ApiResponse::ok(PaymentAckResponse { credited })))
}
