//! Shared fixtures for the worker test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use wbgen_core::config::generation::{GenerationConfig, GenerationSettings};
use wbgen_core::config::worker::WorkerConfig;
use wbgen_core::traits::clock::{Clock, SystemClock};
use wbgen_core::traits::provider::{
    GeneratedAsset, GenerationProvider, GenerationRequest, ProviderError,
};
use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_core::traits::storage::BlobStore;
use wbgen_core::types::id::{JobId, TaskId, UserId};
use wbgen_database::memory::{
    memory_stores, MemoryJobStore, MemoryLedger, MemoryNotificationStore, MemoryTaskStore,
};
use wbgen_entity::job::{GenerationKind, Job, JobSpec};
use wbgen_entity::task::Task;
use wbgen_service::{JobService, LedgerService, NotificationService};
use wbgen_storage::MemoryBlobStore;

use crate::executor::TaskExecutor;
use crate::orchestrator::JobOrchestrator;

/// Provider playing back a scripted sequence of outcomes.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<GeneratedAsset, ProviderError>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn push(&self, step: Result<GeneratedAsset, ProviderError>) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedAsset, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Terminal {
                    message: "unscripted provider call".to_string(),
                })
            })
    }
}

/// Ready-made script steps.
pub mod scripted {
    use super::*;

    pub fn ok() -> Result<GeneratedAsset, ProviderError> {
        Ok(GeneratedAsset {
            bytes: Bytes::from_static(b"pixels"),
            mime_type: "image/png".to_string(),
        })
    }

    pub fn rate_limited() -> Result<GeneratedAsset, ProviderError> {
        Err(ProviderError::Retriable {
            message: "Rate limited (429)".to_string(),
            retry_after: None,
        })
    }

    pub fn overloaded() -> Result<GeneratedAsset, ProviderError> {
        Err(ProviderError::Retriable {
            message: "Upstream unavailable (503)".to_string(),
            retry_after: None,
        })
    }

    pub fn terminal(message: &str) -> Result<GeneratedAsset, ProviderError> {
        Err(ProviderError::Terminal {
            message: message.to_string(),
        })
    }
}

#[derive(Debug)]
struct NoopScheduler;

impl JobScheduler for NoopScheduler {
    fn schedule(&self, _job_id: JobId) {}
}

/// Fully wired pipeline over the in-memory stores, with zero backoff
/// delays and no pacing so tests run at full speed.
pub struct TestEnv {
    pub jobs: Arc<MemoryJobStore>,
    pub tasks: Arc<MemoryTaskStore>,
    pub ledger: Arc<MemoryLedger>,
    pub notifications: Arc<NotificationService>,
    pub blobs: Arc<MemoryBlobStore>,
    pub provider: Arc<ScriptedProvider>,
    pub executor: Arc<TaskExecutor>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub job_service: JobService,
    pub settings: GenerationSettings,
    pub user: UserId,
}

impl TestEnv {
    pub async fn new(balance: i64) -> Self {
        Self::with_ceiling(balance, 60).await
    }

    pub async fn with_ceiling(balance: i64, ceiling_seconds: u64) -> Self {
        let settings = GenerationSettings {
            cost_per_task: 1,
            max_retries: 3,
            retry_delays_seconds: vec![0, 0, 0],
            max_concurrency: 1,
            pacing_delay_ms: 0,
            wall_clock_ceiling_seconds: ceiling_seconds,
            max_tasks_per_job: 10,
        };
        let generation = GenerationConfig {
            product_card: settings.clone(),
            ..GenerationConfig::default()
        };
        let worker = WorkerConfig {
            max_idle_sleep_seconds: 1,
            ..WorkerConfig::default()
        };

        let (jobs, tasks) = memory_stores();
        let jobs = Arc::new(jobs);
        let tasks = Arc::new(tasks);
        let ledger = Arc::new(MemoryLedger::new());
        let notification_store = Arc::new(MemoryNotificationStore::new());
        let blobs = Arc::new(MemoryBlobStore::new("http://localhost:8080/assets"));
        let provider = Arc::new(ScriptedProvider::default());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let user = UserId::new();
        ledger.set_balance(user, balance);

        let ledger_service = Arc::new(LedgerService::new(ledger.clone(), clock.clone()));
        let notifications = Arc::new(NotificationService::new(notification_store, clock.clone()));

        let executor = Arc::new(TaskExecutor::new(
            jobs.clone(),
            tasks.clone(),
            ledger_service.clone(),
            notifications.clone(),
            blobs.clone(),
            provider.clone(),
            clock.clone(),
        ));
        let orchestrator = Arc::new(JobOrchestrator::new(
            jobs.clone(),
            tasks.clone(),
            executor.clone(),
            ledger_service.clone(),
            notifications.clone(),
            clock.clone(),
            generation.clone(),
            worker,
        ));
        let job_service = JobService::new(
            jobs.clone(),
            tasks.clone(),
            ledger_service,
            Arc::new(NoopScheduler),
            clock,
            generation,
        );

        Self {
            jobs,
            tasks,
            ledger,
            notifications,
            blobs,
            provider,
            executor,
            orchestrator,
            job_service,
            settings,
            user,
        }
    }

    /// Upload a source image and create a product-card job with `task_count`
    /// tasks for the environment's user.
    pub async fn create_job(&self, task_count: u32) -> Job {
        let source = format!("{}/sources/0.jpg", self.user);
        self.blobs
            .put(&source, Bytes::from_static(b"source image"))
            .await
            .unwrap();

        self.job_service
            .create(JobSpec {
                user_id: self.user,
                kind: GenerationKind::ProductCard,
                product_name: "Thermo Mug 450ml".to_string(),
                category: "Kitchen".to_string(),
                description: "Double-wall steel mug.".to_string(),
                source_images: vec![source],
                task_count,
            })
            .await
            .unwrap()
    }

    pub async fn job(&self, id: JobId) -> Job {
        use wbgen_database::traits::JobStore;
        self.jobs.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn task(&self, id: TaskId) -> Task {
        use wbgen_database::traits::TaskStore;
        self.tasks.find_by_id(id).await.unwrap().unwrap()
    }

    pub async fn tasks_of(&self, job: &Job) -> Vec<Task> {
        use wbgen_database::traits::TaskStore;
        self.tasks.find_by_job(job.id).await.unwrap()
    }
}
