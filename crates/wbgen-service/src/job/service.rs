//! Job creation and read-side service.

use std::sync::Arc;

use sqlx::types::Json;
use tracing::{error, info};

use wbgen_core::config::generation::GenerationConfig;
use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_core::types::id::{JobId, TaskId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_database::traits::{JobStore, TaskStore};
use wbgen_entity::job::{Job, JobSpec, JobStatus};
use wbgen_entity::task::{Task, TaskStatus};

use crate::ledger::LedgerService;
use crate::settings::settings_for;

use super::validate;

/// A job together with its tasks, for status polling.
#[derive(Debug, Clone)]
pub struct JobDetails {
    pub job: Job,
    pub tasks: Vec<Task>,
}

/// Creates jobs and serves the caller-facing read side.
#[derive(Debug, Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    tasks: Arc<dyn TaskStore>,
    ledger: Arc<LedgerService>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
    generation: GenerationConfig,
}

impl JobService {
    /// Creates a new job service.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        tasks: Arc<dyn TaskStore>,
        ledger: Arc<LedgerService>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn Clock>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            jobs,
            tasks,
            ledger,
            scheduler,
            clock,
            generation,
        }
    }

    /// Create a job and its tasks, debit the total cost, and hand the job
    /// to the orchestrator. Returns synchronously; generation runs in the
    /// background.
    ///
    /// Ordering: validation, then debit, then rows. A validation failure
    /// debits nothing; an insufficient balance creates no rows. If the
    /// insert itself fails after the debit, the debit is compensated.
    pub async fn create(&self, spec: JobSpec) -> AppResult<Job> {
        let settings = settings_for(&self.generation, spec.kind);
        validate::validate_spec(&spec, settings)?;

        let total_cost = settings.cost_per_task * i64::from(spec.task_count);
        let now = self.clock.now();
        let job_id = JobId::new();

        self.ledger
            .spend(spec.user_id, total_cost, "job_created", Some(job_id))
            .await?;

        let job = Job {
            id: job_id,
            user_id: spec.user_id,
            kind: spec.kind,
            product_name: spec.product_name.clone(),
            category: spec.category.clone(),
            description: spec.description.clone(),
            source_images: Json(spec.source_images.clone()),
            total_count: spec.task_count as i32,
            completed_count: 0,
            total_cost,
            status: JobStatus::Pending,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let tasks: Vec<Task> = (0..spec.task_count as i32)
            .map(|card_index| Task {
                id: TaskId::new(),
                job_id,
                user_id: spec.user_id,
                card_index,
                kind: spec.kind,
                status: TaskStatus::Pending,
                retry_count: 0,
                retry_after_seconds: None,
                last_error: None,
                asset_url: None,
                asset_path: None,
                started_at: None,
                completed_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if let Err(e) = self.jobs.insert_with_tasks(&job, &tasks).await {
            if let Err(refund_err) = self
                .ledger
                .refund(
                    spec.user_id,
                    total_cost,
                    "job_create_rollback",
                    Some(job_id),
                    None,
                )
                .await
            {
                error!(%job_id, error = %refund_err, "Failed to compensate debit after insert failure");
            }
            return Err(e);
        }

        self.scheduler.schedule(job_id);
        info!(%job_id, user_id = %spec.user_id, kind = %spec.kind, tasks = tasks.len(), total_cost, "Created job");
        Ok(job)
    }

    /// A job with its tasks, for the owning user only.
    pub async fn get_details(&self, user_id: UserId, job_id: JobId) -> AppResult<JobDetails> {
        let job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .filter(|job| job.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("Job not found: {job_id}")))?;

        let tasks = self.tasks.find_by_job(job_id).await?;
        Ok(JobDetails { job, tasks })
    }

    /// A user's jobs, newest first.
    pub async fn list(&self, user_id: UserId, page: &PageRequest) -> AppResult<PageResponse<Job>> {
        self.jobs.find_by_user(user_id, page).await
    }
}
