//! Job orchestrator: drives one job's tasks to a terminal outcome.
//!
//! The loop dispatches ready tasks under a per-job concurrency limit with
//! pacing between dispatches, sleeps until the earliest backoff deadline
//! when nothing is ready, and enforces a hard wall-clock ceiling. Work
//! still non-terminal at the ceiling is force-failed and refunded in one
//! batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use chrono::{DateTime, Utc};

use wbgen_core::config::generation::GenerationConfig;
use wbgen_core::config::worker::WorkerConfig;
use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::types::id::{JobId, TaskId};
use wbgen_database::traits::{JobStore, TaskStore};
use wbgen_entity::job::{Job, JobStatus};
use wbgen_entity::notification::Severity;
use wbgen_entity::task::{Task, TaskStatus};
use wbgen_service::{settings_for, LedgerService, NotificationService};

use crate::executor::TaskExecutor;

/// Parameterized per-job control loop. One `run` call owns one job
/// invocation from pickup to terminal state.
#[derive(Debug)]
pub struct JobOrchestrator {
    jobs: Arc<dyn JobStore>,
    tasks: Arc<dyn TaskStore>,
    executor: Arc<TaskExecutor>,
    ledger: Arc<LedgerService>,
    notifications: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    generation: GenerationConfig,
    worker: WorkerConfig,
}

impl JobOrchestrator {
    /// Creates a new orchestrator.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        tasks: Arc<dyn TaskStore>,
        executor: Arc<TaskExecutor>,
        ledger: Arc<LedgerService>,
        notifications: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
        generation: GenerationConfig,
        worker: WorkerConfig,
    ) -> Self {
        Self {
            jobs,
            tasks,
            executor,
            ledger,
            notifications,
            clock,
            generation,
            worker,
        }
    }

    /// Drive the job until every task is terminal or the wall-clock ceiling
    /// is hit. Safe to invoke twice for the same job: the task-level claims
    /// arbitrate, so a re-adopted job never double-executes a task.
    pub async fn run(&self, job_id: JobId) -> AppResult<()> {
        let Some(job) = self.jobs.find_by_id(job_id).await? else {
            warn!(%job_id, "Orchestrator invoked for unknown job");
            return Ok(());
        };
        if job.status.is_terminal() {
            return Ok(());
        }

        let settings = settings_for(&self.generation, job.kind).clone();
        let picked_up = self.jobs.mark_processing(job_id, self.clock.now()).await?;
        if picked_up {
            info!(%job_id, kind = %job.kind, tasks = job.total_count, "Job picked up");
        } else {
            info!(%job_id, "Re-adopting job already in processing");
        }

        let deadline = Instant::now() + Duration::from_secs(settings.wall_clock_ceiling_seconds);
        let pacing = Duration::from_millis(settings.pacing_delay_ms);
        let max_idle = Duration::from_secs(self.worker.max_idle_sleep_seconds);
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrency));
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            if Instant::now() >= deadline {
                // Let in-flight attempts finish; they hold task claims.
                while in_flight.join_next().await.is_some() {}
                return self.force_fail_remaining(&job).await;
            }

            // Heartbeat: the reclaimer treats a stale `updated_at` as a
            // dead orchestrator.
            self.jobs.touch(job_id, self.clock.now()).await?;

            let snapshot = self.tasks.find_by_job(job_id).await?;
            if snapshot.iter().all(Task::is_terminal) {
                while in_flight.join_next().await.is_some() {}
                return self.finalize(&job, &snapshot).await;
            }

            let now = self.clock.now();
            let ready: Vec<TaskId> = snapshot
                .iter()
                .filter(|t| t.is_ready(now))
                .map(|t| t.id)
                .collect();

            if ready.is_empty() {
                let sleep = next_sleep(&snapshot, now, max_idle);
                tokio::select! {
                    _ = in_flight.join_next(), if !in_flight.is_empty() => {}
                    _ = tokio::time::sleep(sleep) => {}
                }
                continue;
            }

            for task_id in ready {
                if Instant::now() >= deadline {
                    break;
                }
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| AppError::internal("Orchestrator semaphore closed"))?;
                let executor = Arc::clone(&self.executor);
                let job = job.clone();
                let settings = settings.clone();
                in_flight.spawn(async move {
                    let _permit = permit;
                    if let Err(e) = executor.execute(&job, task_id, &settings).await {
                        error!(%task_id, job_id = %job.id, error = %e, "Task execution errored");
                    }
                });
                tokio::time::sleep(pacing).await;
            }

            // Reap finished attempts before requerying.
            while in_flight.try_join_next().is_some() {}
        }
    }

    /// Compute the aggregate outcome once every task is terminal.
    async fn finalize(&self, job: &Job, tasks: &[Task]) -> AppResult<()> {
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let failed = tasks.len() - completed;

        let (status, message) = if completed == 0 {
            (JobStatus::Failed, Some("All tasks failed".to_string()))
        } else if failed > 0 {
            (
                JobStatus::Completed,
                Some(format!(
                    "{failed} of {} tasks failed; tokens for failed tasks were refunded",
                    tasks.len()
                )),
            )
        } else {
            (JobStatus::Completed, None)
        };

        if !self
            .jobs
            .finish(job.id, status, message.as_deref(), self.clock.now())
            .await?
        {
            // Another path (ceiling, reclaimer) already closed the job.
            return Ok(());
        }

        let (title, body, severity) = match status {
            JobStatus::Completed if failed == 0 => (
                "Generation complete",
                format!("All {completed} assets for \"{}\" are ready.", job.product_name),
                Severity::Info,
            ),
            JobStatus::Completed => (
                "Generation finished with errors",
                format!(
                    "{completed} of {} assets for \"{}\" are ready. Tokens for the failed ones were refunded.",
                    tasks.len(),
                    job.product_name
                ),
                Severity::Warning,
            ),
            _ => (
                "Generation failed",
                format!(
                    "No assets could be generated for \"{}\". Your tokens were refunded.",
                    job.product_name
                ),
                Severity::Error,
            ),
        };
        self.notifications
            .notify_best_effort(job.user_id, title, &body, severity)
            .await;

        info!(job_id = %job.id, status = %status, completed, failed, "Job finished");
        Ok(())
    }

    /// Ceiling handling: force every still-non-terminal task to `failed`,
    /// refund the batch in one credit, close the job, and send a single
    /// timeout notification.
    async fn force_fail_remaining(&self, job: &Job) -> AppResult<()> {
        let snapshot = self.tasks.find_by_job(job.id).await?;
        let mut failed_count = 0i64;

        for task in snapshot.iter().filter(|t| !t.is_terminal()) {
            if self
                .tasks
                .fail(task.id, "timeout_exceeded", self.clock.now())
                .await?
            {
                failed_count += 1;
            }
        }

        let refund_total = failed_count * job.refund_per_task();
        if refund_total > 0 {
            self.ledger
                .refund(
                    job.user_id,
                    refund_total,
                    "timeout_refund",
                    Some(job.id),
                    None,
                )
                .await?;
        }

        if self
            .jobs
            .finish(
                job.id,
                JobStatus::Failed,
                Some("timeout_exceeded"),
                self.clock.now(),
            )
            .await?
        {
            self.notifications
                .notify_best_effort(
                    job.user_id,
                    "Generation timed out",
                    &format!(
                        "Generation for \"{}\" ran out of time; {failed_count} task(s) were cancelled and {refund_total} token(s) returned to your balance.",
                        job.product_name
                    ),
                    Severity::Error,
                )
                .await;
        }

        warn!(job_id = %job.id, failed_count, refund_total, "Job hit its wall-clock ceiling");
        Ok(())
    }
}

/// How long to sleep when nothing is ready: until the earliest backoff
/// deadline, capped, with a short poll when tasks are mid-flight elsewhere.
fn next_sleep(tasks: &[Task], now: DateTime<Utc>, max_idle: Duration) -> Duration {
    let earliest = tasks.iter().filter_map(Task::ready_at).min();
    match earliest {
        Some(at) if at > now => (at - now).to_std().unwrap_or(Duration::ZERO).min(max_idle),
        Some(_) => Duration::from_millis(100),
        None => Duration::from_millis(250).min(max_idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::{scripted, TestEnv};
    use wbgen_database::traits::TokenLedger;

    #[tokio::test]
    async fn test_all_tasks_succeed() {
        // Scenario: balance 10, six tasks at one token each.
        let env = TestEnv::new(10).await;
        let job = env.create_job(6).await;
        for _ in 0..6 {
            env.provider.push(scripted::ok());
        }

        env.orchestrator.run(job.id).await.unwrap();

        let job = env.job(job.id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.completed_count, 6);
        assert!(job.error_message.is_none());
        assert!(job.completed_at.is_some());
        assert_eq!(env.ledger.balance(job.user_id).await.unwrap(), 4);
        // One summary notification.
        assert_eq!(env.notifications.unread_count(job.user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_partial_success_refunds_failed_share() {
        // Scenario: one task exhausts its retries, five succeed.
        let env = TestEnv::new(10).await;
        let job = env.create_job(6).await;

        // Concurrency is 1 and pacing 0, so dispatch order follows
        // card_index: three successes, one rate-limited task, two more
        // successes, then the rate-limited task burns its retry budget.
        for _ in 0..3 {
            env.provider.push(scripted::ok());
        }
        env.provider.push(scripted::rate_limited());
        for _ in 0..2 {
            env.provider.push(scripted::ok());
        }
        for _ in 0..3 {
            env.provider.push(scripted::rate_limited());
        }

        env.orchestrator.run(job.id).await.unwrap();

        let finished = env.job(job.id).await;
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.completed_count, 5);
        assert!(finished.error_message.as_deref().unwrap().contains("1 of 6"));
        // Balance: 10 - 6 + 1 refunded.
        assert_eq!(env.ledger.balance(job.user_id).await.unwrap(), 5);

        let tasks = env.tasks_of(&job).await;
        let failed: Vec<_> = tasks.iter().filter(|t| t.status == TaskStatus::Failed).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].card_index, 3);
        assert_eq!(failed[0].retry_count, 3);

        // One per-task failure notification plus one job summary.
        assert_eq!(env.notifications.unread_count(job.user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_all_tasks_fail() {
        let env = TestEnv::new(10).await;
        let job = env.create_job(2).await;
        env.provider.push(scripted::terminal("quota exhausted"));
        env.provider.push(scripted::terminal("quota exhausted"));

        env.orchestrator.run(job.id).await.unwrap();

        let finished = env.job(job.id).await;
        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(finished.completed_count, 0);
        // Full refund: 10 - 2 + 2.
        assert_eq!(env.ledger.balance(job.user_id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_ceiling_force_fails_and_refunds_batch() {
        // Scenario: ceiling of zero, two tasks still pending.
        let env = TestEnv::with_ceiling(10, 0).await;
        let job = env.create_job(2).await;

        env.orchestrator.run(job.id).await.unwrap();

        let finished = env.job(job.id).await;
        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(finished.error_message.as_deref(), Some("timeout_exceeded"));

        let tasks = env.tasks_of(&job).await;
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Failed));
        assert!(tasks
            .iter()
            .all(|t| t.last_error.as_deref() == Some("timeout_exceeded")));

        // Both shares refunded, one timeout notification, no provider calls.
        assert_eq!(env.ledger.balance(job.user_id).await.unwrap(), 10);
        assert_eq!(env.notifications.unread_count(job.user_id).await.unwrap(), 1);
        assert_eq!(env.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rerun_of_finished_job_is_a_noop() {
        let env = TestEnv::new(10).await;
        let job = env.create_job(1).await;
        env.provider.push(scripted::ok());

        env.orchestrator.run(job.id).await.unwrap();
        let balance = env.ledger.balance(job.user_id).await.unwrap();

        env.orchestrator.run(job.id).await.unwrap();

        let finished = env.job(job.id).await;
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.completed_count, 1);
        assert_eq!(env.ledger.balance(job.user_id).await.unwrap(), balance);
        assert_eq!(env.provider.call_count(), 1);
    }

    #[test]
    fn test_next_sleep_targets_earliest_backoff() {
        use wbgen_core::types::id::{JobId, TaskId, UserId};
        use wbgen_entity::job::GenerationKind;

        let now = Utc::now();
        let task = |retry_after: Option<i64>, status: TaskStatus| Task {
            id: TaskId::new(),
            job_id: JobId::new(),
            user_id: UserId::new(),
            card_index: 0,
            kind: GenerationKind::ProductCard,
            status,
            retry_count: 0,
            retry_after_seconds: retry_after,
            last_error: None,
            asset_url: None,
            asset_path: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let max_idle = Duration::from_secs(30);

        // Earliest deadline in 12s wins.
        let tasks = vec![
            task(Some(12), TaskStatus::Retrying),
            task(Some(50), TaskStatus::Retrying),
        ];
        let sleep = next_sleep(&tasks, now, max_idle);
        assert!(sleep <= Duration::from_secs(12));
        assert!(sleep > Duration::from_secs(10));

        // Far-off deadlines are capped at the idle maximum.
        let tasks = vec![task(Some(300), TaskStatus::Retrying)];
        assert_eq!(next_sleep(&tasks, now, max_idle), max_idle);

        // Only in-flight tasks left: short poll.
        let tasks = vec![task(None, TaskStatus::Processing)];
        assert_eq!(next_sleep(&tasks, now, max_idle), Duration::from_millis(250));
    }
}
