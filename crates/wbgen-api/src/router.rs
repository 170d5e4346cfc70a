//! Route table and middleware stack.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use wbgen_core::config::app::CorsConfig;

use crate::handlers::{health, job, notification, payment, token};
use crate::state::AppState;

/// Builds the application router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    let body_limit = state.config.server.max_body_size_bytes as usize;

    let api = Router::new()
        .route("/health", get(health::health))
        .merge(job_routes())
        .merge(token_routes())
        .merge(notification_routes())
        .merge(webhook_routes());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(job::create_job).get(job::list_jobs))
        .route("/jobs/{id}", get(job::get_job))
}

fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/tokens/balance", get(token::balance))
        .route("/tokens/history", get(token::history))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notification::list))
        .route(
            "/notifications/unread-count",
            get(notification::unread_count),
        )
        .route("/notifications/{id}/read", post(notification::mark_read))
}

fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/payment", post(payment::payment_webhook))
}

/// Builds the CORS layer from configuration. Origins that fail to parse
/// are skipped with a warning rather than failing startup.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age_seconds));

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin, "Skipping unparsable CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use wbgen_core::config::AppConfig;
    use wbgen_core::traits::clock::{Clock, SystemClock};
    use wbgen_core::traits::scheduler::JobScheduler;
    use wbgen_core::types::id::{JobId, UserId};
    use wbgen_database::memory::{
        memory_stores, MemoryLedger, MemoryNotificationStore,
    };
    use wbgen_service::{JobService, LedgerService, NotificationService};

    #[derive(Debug)]
    struct NoopScheduler;

    impl JobScheduler for NoopScheduler {
        fn schedule(&self, _job_id: JobId) {}
    }

    fn test_config() -> AppConfig {
        serde_json::from_value(serde_json::json!({
            "server": {},
            "database": { "url": "postgres://localhost/wbgen_test" },
            "storage": {},
            "provider": { "base_url": "http://localhost:9999" }
        }))
        .unwrap()
    }

    fn test_state(user: UserId, balance: i64) -> AppState {
        let config = Arc::new(test_config());
        let (jobs, tasks) = memory_stores();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.set_balance(user, balance);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let ledger_service = Arc::new(LedgerService::new(ledger, clock.clone()));
        let notifications = Arc::new(NotificationService::new(
            Arc::new(MemoryNotificationStore::new()),
            clock.clone(),
        ));
        let jobs = Arc::new(JobService::new(
            Arc::new(jobs),
            Arc::new(tasks),
            ledger_service.clone(),
            Arc::new(NoopScheduler),
            clock,
            config.generation.clone(),
        ));

        AppState::new(config, jobs, ledger_service, notifications)
    }

    fn create_job_body() -> String {
        serde_json::json!({
            "kind": "product_card",
            "product_name": "Thermo Mug 450ml",
            "category": "Kitchen",
            "description": "Double-wall steel mug.",
            "source_images": ["u/j/sources/0.jpg"],
            "task_count": 2
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = build_router(test_state(UserId::new(), 0));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_job_returns_created() {
        let user = UserId::new();
        let app = build_router(test_state(user, 10));
        let response = app
            .oneshot(
                Request::post("/api/jobs")
                    .header("content-type", "application/json")
                    .header("x-user-id", user.to_string())
                    .body(Body::from(create_job_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_job_without_balance_is_payment_required() {
        let user = UserId::new();
        let app = build_router(test_state(user, 0));
        let response = app
            .oneshot(
                Request::post("/api/jobs")
                    .header("content-type", "application/json")
                    .header("x-user-id", user.to_string())
                    .body(Body::from(create_job_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_missing_identity_is_forbidden() {
        let app = build_router(test_state(UserId::new(), 0));
        let response = app
            .oneshot(Request::get("/api/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let user = UserId::new();
        let app = build_router(test_state(user, 0));
        let response = app
            .oneshot(
                Request::get(format!("/api/jobs/{}", JobId::new()))
                    .header("x-user-id", user.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_payment_delivery_is_absorbed() {
        let user = UserId::new();
        let app = build_router(test_state(user, 0));
        let body = serde_json::json!({
            "payment_id": "pay-42",
            "user_id": user,
            "amount": 50,
            "status": "succeeded"
        })
        .to_string();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::post("/api/webhooks/payment")
                        .header("content-type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::get("/api/tokens/balance")
                    .header("x-user-id", user.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
