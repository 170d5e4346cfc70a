//! WBGen server entry point.
//!
//! Wires the crates together: configuration, database, storage, the
//! generation provider, services, the background pipeline, and the HTTP
//! server with graceful shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use wbgen_core::config::AppConfig;
use wbgen_core::error::AppError;
use wbgen_core::traits::clock::{Clock, SystemClock};
use wbgen_core::traits::provider::GenerationProvider;
use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_core::traits::storage::BlobStore;
use wbgen_database::repositories::job::JobRepository;
use wbgen_database::repositories::ledger::LedgerRepository;
use wbgen_database::repositories::notification::NotificationRepository;
use wbgen_database::repositories::task::TaskRepository;
use wbgen_database::traits::{JobStore, NotificationStore, TaskStore, TokenLedger};
use wbgen_provider::HttpGenerationProvider;
use wbgen_service::{JobService, LedgerService, NotificationService};
use wbgen_storage::LocalBlobStore;
use wbgen_worker::{JobOrchestrator, OrchestratorPool, Reclaimer, TaskExecutor};

#[tokio::main]
async fn main() {
    let env = std::env::var("WBGEN_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing from the logging configuration.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting WBGen v{}", env!("CARGO_PKG_VERSION"));

    // Database connection + migrations.
    let pool = wbgen_database::connection::connect(&config.database).await?;
    wbgen_database::migration::run_migrations(&pool).await?;

    // Blob storage for source images and generated assets.
    let blobs: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(&config.storage.data_root, &config.storage.public_base_url).await?,
    );

    // External generation provider.
    let provider: Arc<dyn GenerationProvider> =
        Arc::new(HttpGenerationProvider::new(&config.provider)?);

    // Repositories.
    let jobs: Arc<dyn JobStore> = Arc::new(JobRepository::new(pool.clone()));
    let tasks: Arc<dyn TaskStore> = Arc::new(TaskRepository::new(pool.clone()));
    let ledger: Arc<dyn TokenLedger> = Arc::new(LedgerRepository::new(pool.clone()));
    let notifications: Arc<dyn NotificationStore> =
        Arc::new(NotificationRepository::new(pool.clone()));

    // Services.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger_service = Arc::new(LedgerService::new(ledger, clock.clone()));
    let notification_service = Arc::new(NotificationService::new(notifications, clock.clone()));

    // Background generation pipeline.
    let executor = Arc::new(TaskExecutor::new(
        jobs.clone(),
        tasks.clone(),
        ledger_service.clone(),
        notification_service.clone(),
        blobs,
        provider,
        clock.clone(),
    ));
    let orchestrator = Arc::new(JobOrchestrator::new(
        jobs.clone(),
        tasks.clone(),
        executor,
        ledger_service.clone(),
        notification_service.clone(),
        clock.clone(),
        config.generation.clone(),
        config.worker.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler: Arc<dyn JobScheduler> =
        Arc::new(OrchestratorPool::new(orchestrator, shutdown_rx.clone()));

    let job_service = Arc::new(JobService::new(
        jobs.clone(),
        tasks,
        ledger_service.clone(),
        scheduler.clone(),
        clock.clone(),
        config.generation.clone(),
    ));

    // Stale-job reclaimer.
    let reclaimer_handle = if config.worker.enabled {
        let reclaimer = Reclaimer::new(jobs, scheduler, clock, config.worker.clone());
        let reclaimer_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            reclaimer.run(reclaimer_shutdown).await;
        }))
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // HTTP server.
    let state = wbgen_api::AppState::new(
        Arc::new(config.clone()),
        job_service,
        ledger_service,
        notification_service,
    );
    let app = wbgen_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("WBGen server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(handle) = reclaimer_handle {
        let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);
        let _ = tokio::time::timeout(grace, handle).await;
    }

    pool.close().await;
    tracing::info!("WBGen server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
