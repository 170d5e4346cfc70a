//! End-to-end pipeline tests over the in-memory stores.
//!
//! Exercises the full wiring the server binary uses, minus PostgreSQL and
//! the real provider: HTTP API, job service, orchestrator pool, executor,
//! ledger, and notifications.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use tokio::sync::watch;
use tower::ServiceExt;

use wbgen_core::config::generation::{GenerationConfig, GenerationSettings};
use wbgen_core::config::worker::WorkerConfig;
use wbgen_core::config::AppConfig;
use wbgen_core::traits::clock::{Clock, SystemClock};
use wbgen_core::traits::provider::{
    GeneratedAsset, GenerationProvider, GenerationRequest, ProviderError,
};
use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_core::traits::storage::BlobStore;
use wbgen_core::types::id::UserId;
use wbgen_database::memory::{memory_stores, MemoryLedger, MemoryNotificationStore};
use wbgen_database::traits::TokenLedger;
use wbgen_service::{JobService, LedgerService, NotificationService};
use wbgen_storage::MemoryBlobStore;
use wbgen_worker::{JobOrchestrator, OrchestratorPool, TaskExecutor};

/// Provider that always succeeds with a fixed asset.
#[derive(Debug)]
struct FixedProvider;

#[async_trait]
impl GenerationProvider for FixedProvider {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedAsset, ProviderError> {
        Ok(GeneratedAsset {
            bytes: Bytes::from_static(b"pixels"),
            mime_type: "image/png".to_string(),
        })
    }
}

struct Harness {
    app: axum::Router,
    blobs: Arc<MemoryBlobStore>,
    ledger: Arc<MemoryLedger>,
    user: UserId,
    _shutdown: watch::Sender<bool>,
}

fn harness(balance: i64) -> Harness {
    let settings = GenerationSettings {
        cost_per_task: 1,
        max_retries: 3,
        retry_delays_seconds: vec![0, 0, 0],
        max_concurrency: 2,
        pacing_delay_ms: 0,
        wall_clock_ceiling_seconds: 60,
        max_tasks_per_job: 10,
    };
    let generation = GenerationConfig {
        product_card: settings,
        ..GenerationConfig::default()
    };
    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "server": {},
        "database": { "url": "postgres://localhost/unused" },
        "storage": {},
        "provider": { "base_url": "http://localhost:9999" }
    }))
    .unwrap();

    let (jobs, tasks) = memory_stores();
    let jobs = Arc::new(jobs);
    let tasks = Arc::new(tasks);
    let ledger = Arc::new(MemoryLedger::new());
    let blobs = Arc::new(MemoryBlobStore::new("http://localhost:8080/assets"));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let user = UserId::new();
    ledger.set_balance(user, balance);

    let ledger_service = Arc::new(LedgerService::new(ledger.clone(), clock.clone()));
    let notifications = Arc::new(NotificationService::new(
        Arc::new(MemoryNotificationStore::new()),
        clock.clone(),
    ));

    let executor = Arc::new(TaskExecutor::new(
        jobs.clone(),
        tasks.clone(),
        ledger_service.clone(),
        notifications.clone(),
        blobs.clone(),
        Arc::new(FixedProvider),
        clock.clone(),
    ));
    let orchestrator = Arc::new(JobOrchestrator::new(
        jobs.clone(),
        tasks.clone(),
        executor,
        ledger_service.clone(),
        notifications.clone(),
        clock.clone(),
        generation.clone(),
        WorkerConfig {
            max_idle_sleep_seconds: 1,
            ..WorkerConfig::default()
        },
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler: Arc<dyn JobScheduler> =
        Arc::new(OrchestratorPool::new(orchestrator, shutdown_rx));

    let job_service = Arc::new(JobService::new(
        jobs,
        tasks,
        ledger_service.clone(),
        scheduler,
        clock,
        generation,
    ));

    let state = wbgen_api::AppState::new(
        Arc::new(config),
        job_service,
        ledger_service,
        notifications,
    );

    Harness {
        app: wbgen_api::build_router(state),
        blobs,
        ledger,
        user,
        _shutdown: shutdown_tx,
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_job_and_poll_to_completion_over_http() {
    let h = harness(10);

    let source = format!("{}/sources/0.jpg", h.user);
    h.blobs
        .put(&source, Bytes::from_static(b"source image"))
        .await
        .unwrap();

    let create = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/jobs")
                .header("content-type", "application/json")
                .header("x-user-id", h.user.to_string())
                .body(Body::from(
                    serde_json::json!({
                        "kind": "product_card",
                        "product_name": "Thermo Mug 450ml",
                        "category": "Kitchen",
                        "description": "Double-wall steel mug.",
                        "source_images": [source],
                        "task_count": 4
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let created = json_body(create).await;
    assert_eq!(created["data"]["status"], "pending");
    let job_id = created["data"]["id"].as_str().unwrap().to_string();

    // The orchestrator runs detached; poll the status endpoint like a
    // client would.
    let mut last = serde_json::Value::Null;
    for _ in 0..200 {
        let response = h
            .app
            .clone()
            .oneshot(
                Request::get(format!("/api/jobs/{job_id}"))
                    .header("x-user-id", h.user.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = json_body(response).await;
        if last["data"]["status"] == "completed" || last["data"]["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(last["data"]["status"], "completed");
    assert_eq!(last["data"]["completed_count"], 4);
    let tasks = last["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 4);
    for task in tasks {
        assert_eq!(task["status"], "completed");
        let url = task["asset_url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8080/assets/"));
    }

    // 4 tasks at 1 token each.
    assert_eq!(h.ledger.balance(h.user).await.unwrap(), 6);
}

#[tokio::test]
async fn test_payment_credits_unlock_job_creation() {
    let h = harness(0);

    let source = format!("{}/sources/0.jpg", h.user);
    h.blobs
        .put(&source, Bytes::from_static(b"source image"))
        .await
        .unwrap();

    let job_request = || {
        Request::post("/api/jobs")
            .header("content-type", "application/json")
            .header("x-user-id", h.user.to_string())
            .body(Body::from(
                serde_json::json!({
                    "kind": "product_card",
                    "product_name": "Thermo Mug 450ml",
                    "category": "Kitchen",
                    "source_images": [source.clone()],
                    "task_count": 2
                })
                .to_string(),
            ))
            .unwrap()
    };

    let rejected = h.app.clone().oneshot(job_request()).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::PAYMENT_REQUIRED);

    let webhook = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/webhooks/payment")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "payment_id": "pay-100",
                        "user_id": h.user,
                        "amount": 10,
                        "status": "succeeded"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(webhook.status(), StatusCode::OK);
    assert_eq!(json_body(webhook).await["data"]["credited"], true);

    let accepted = h.app.clone().oneshot(job_request()).await.unwrap();
    assert_eq!(accepted.status(), StatusCode::CREATED);
}
