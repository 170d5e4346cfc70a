//! Task executor: one generation attempt for one ready task.
//!
//! Every attempt starts with a guarded claim and ends with a guarded
//! terminal or retrying transition. The claim result decides ownership, so
//! two execution paths racing on the same task cannot both act on it, and
//! the refund issued on the failure path rides on the `fail` transition
//! having been won.

use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

use wbgen_core::config::generation::GenerationSettings;
use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::traits::provider::{GenerationProvider, GenerationRequest, ProviderError};
use wbgen_core::traits::storage::BlobStore;
use wbgen_core::types::id::TaskId;
use wbgen_database::traits::{JobStore, TaskStore};
use wbgen_entity::job::Job;
use wbgen_entity::notification::Severity;
use wbgen_entity::task::Task;
use wbgen_provider::prompt::{self, PromptContext};
use wbgen_service::{LedgerService, NotificationService};
use wbgen_storage::paths;

/// Outcome of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task completed and the job's counter was bumped.
    Completed,
    /// Retriable failure; the task is parked in backoff.
    Retrying,
    /// Terminal failure; the task's share of the cost was refunded.
    Failed,
    /// The task was not ours to run: claim lost or already terminal.
    Skipped,
}

/// Runs one task end to end: claim, prompt, source images, provider call,
/// asset persistence, and the resulting state transition.
#[derive(Debug)]
pub struct TaskExecutor {
    jobs: Arc<dyn JobStore>,
    tasks: Arc<dyn TaskStore>,
    ledger: Arc<LedgerService>,
    notifications: Arc<NotificationService>,
    blobs: Arc<dyn BlobStore>,
    provider: Arc<dyn GenerationProvider>,
    clock: Arc<dyn Clock>,
}

impl TaskExecutor {
    /// Creates a new task executor.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        tasks: Arc<dyn TaskStore>,
        ledger: Arc<LedgerService>,
        notifications: Arc<NotificationService>,
        blobs: Arc<dyn BlobStore>,
        provider: Arc<dyn GenerationProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            tasks,
            ledger,
            notifications,
            blobs,
            provider,
            clock,
        }
    }

    /// Run one attempt for a task of `job`.
    pub async fn execute(
        &self,
        job: &Job,
        task_id: TaskId,
        settings: &GenerationSettings,
    ) -> AppResult<TaskOutcome> {
        let Some(task) = self.tasks.claim(task_id, self.clock.now()).await? else {
            return Ok(TaskOutcome::Skipped);
        };

        let request = match self.build_request(job, &task).await {
            Ok(request) => request,
            Err(reason) => return self.fail_terminal(job, &task, &reason).await,
        };

        match self.provider.generate(&request).await {
            Ok(asset) => self.finish_success(job, &task, asset).await,
            Err(error) => self.handle_provider_error(job, &task, error, settings).await,
        }
    }

    /// Render the prompt and fetch the job's source images.
    async fn build_request(
        &self,
        job: &Job,
        task: &Task,
    ) -> Result<GenerationRequest, String> {
        let prompt = prompt::render(
            job.kind,
            &PromptContext {
                product_name: &job.product_name,
                category: &job.category,
                description: &job.description,
                card_index: task.card_index,
                total_count: job.total_count,
            },
        );

        let mut source_images = Vec::with_capacity(job.source_images.len());
        for path in job.source_images.iter() {
            match self.blobs.get(path).await {
                Ok(bytes) => source_images.push(bytes),
                Err(e) => return Err(format!("no_source_image: {path}: {e}")),
            }
        }

        Ok(GenerationRequest {
            prompt,
            source_images,
        })
    }

    async fn finish_success(
        &self,
        job: &Job,
        task: &Task,
        asset: wbgen_core::traits::provider::GeneratedAsset,
    ) -> AppResult<TaskOutcome> {
        let path = paths::generated_asset(
            job.user_id,
            job.id,
            task.card_index,
            job.kind.as_str(),
            asset.extension(),
        );
        let url = match self.blobs.put(&path, asset.bytes).await {
            Ok(url) => url,
            Err(e) => {
                return self
                    .fail_terminal(job, task, &format!("asset_store_failed: {e}"))
                    .await;
            }
        };

        let now = self.clock.now();
        if !self.tasks.complete(task.id, &url, &path, now).await? {
            // The task left `processing` under us (force-failed at the
            // ceiling). The stored object is orphaned but never published.
            return Ok(TaskOutcome::Skipped);
        }
        self.jobs.increment_completed(job.id, now).await?;

        info!(task_id = %task.id, job_id = %job.id, card_index = task.card_index, %url, "Task completed");
        Ok(TaskOutcome::Completed)
    }

    async fn handle_provider_error(
        &self,
        job: &Job,
        task: &Task,
        error: ProviderError,
        settings: &GenerationSettings,
    ) -> AppResult<TaskOutcome> {
        match error {
            ProviderError::Retriable {
                message,
                retry_after,
            } if task.retry_count < settings.max_retries as i32 => {
                let attempt = task.retry_count as u32 + 1;
                let delay_seconds = match retry_after {
                    // Honor the provider's hint, with jitter so parked
                    // tasks do not stampede back in lockstep.
                    Some(hint) => hint.as_secs() + rand::thread_rng().gen_range(0..=5),
                    None => settings.retry_delay_seconds(attempt),
                };

                if !self
                    .tasks
                    .set_retrying(task.id, delay_seconds as i64, &message, self.clock.now())
                    .await?
                {
                    return Ok(TaskOutcome::Skipped);
                }

                warn!(
                    task_id = %task.id,
                    job_id = %job.id,
                    attempt,
                    delay_seconds,
                    error = %message,
                    "Task parked for retry"
                );
                Ok(TaskOutcome::Retrying)
            }
            ProviderError::Retriable { message, .. } => {
                self.fail_terminal(job, task, &format!("retries_exhausted: {message}"))
                    .await
            }
            ProviderError::Terminal { message } => self.fail_terminal(job, task, &message).await,
        }
    }

    /// Guarded terminal failure. The refund and the user notification are
    /// issued only when the `fail` transition was won here.
    async fn fail_terminal(&self, job: &Job, task: &Task, reason: &str) -> AppResult<TaskOutcome> {
        if !self.tasks.fail(task.id, reason, self.clock.now()).await? {
            return Ok(TaskOutcome::Skipped);
        }

        let amount = job.refund_per_task();
        self.ledger
            .refund(
                job.user_id,
                amount,
                "task_failed_refund",
                Some(job.id),
                Some(task.id),
            )
            .await?;

        self.notifications
            .notify_best_effort(
                job.user_id,
                "Generation step failed",
                &format!(
                    "Card {} of \"{}\" could not be generated. {} token(s) were returned to your balance.",
                    task.card_index + 1,
                    job.product_name,
                    amount
                ),
                Severity::Warning,
            )
            .await;

        warn!(task_id = %task.id, job_id = %job.id, reason, refunded = amount, "Task failed");
        Ok(TaskOutcome::Failed)
    }
}
