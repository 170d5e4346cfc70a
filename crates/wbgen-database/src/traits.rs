//! Store traits for jobs, tasks, the token ledger, and notifications.
//!
//! These traits are the seams between the business logic and persistence.
//! They live beside their implementations (rather than in `wbgen-core`)
//! because they speak entity types. Two families implement them: the
//! PostgreSQL repositories in [`crate::repositories`] and the in-memory
//! stores in [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wbgen_core::result::AppResult;
use wbgen_core::types::id::{JobId, NotificationId, TaskId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::job::{Job, JobStatus};
use wbgen_entity::ledger::LedgerEntry;
use wbgen_entity::notification::Notification;
use wbgen_entity::task::Task;

/// Persistence operations for jobs.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a job together with all its tasks in one transaction.
    async fn insert_with_tasks(&self, job: &Job, tasks: &[Task]) -> AppResult<()>;

    /// Find a job by ID.
    async fn find_by_id(&self, id: JobId) -> AppResult<Option<Job>>;

    /// List a user's jobs, newest first.
    async fn find_by_user(&self, user_id: UserId, page: &PageRequest)
        -> AppResult<PageResponse<Job>>;

    /// Guarded `pending → processing` transition; sets `started_at` on the
    /// first pickup. Returns `false` when the job was already picked up or
    /// is terminal.
    async fn mark_processing(&self, id: JobId, now: DateTime<Utc>) -> AppResult<bool>;

    /// Guarded terminal transition to `completed` or `failed`. Returns
    /// `false` when the job was already terminal.
    async fn finish(
        &self,
        id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Atomically increment `completed_count`. Called exactly once per task
    /// completion, guarded by the task's own `processing → completed`
    /// transition having succeeded.
    async fn increment_completed(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()>;

    /// Bump `updated_at` as an orchestrator liveness heartbeat.
    async fn touch(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()>;

    /// Jobs stuck in `processing` whose heartbeat is older than `cutoff`.
    async fn find_stale_processing(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Job>>;
}

/// Persistence operations for tasks.
#[async_trait]
pub trait TaskStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a task by ID.
    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<Task>>;

    /// All tasks of a job, ordered by `card_index`.
    async fn find_by_job(&self, job_id: JobId) -> AppResult<Vec<Task>>;

    /// Guarded claim: `pending`/`retrying` with elapsed backoff →
    /// `processing`. Returns the claimed task, or `None` when another
    /// execution path owns it or it is not ready.
    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> AppResult<Option<Task>>;

    /// Guarded `processing → completed` with the stored asset. Returns
    /// `false` when the task was not in `processing` (duplicate completion).
    async fn complete(
        &self,
        id: TaskId,
        asset_url: &str,
        asset_path: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Guarded transition of any non-terminal task to `failed`. Returns
    /// `false` when the task was already terminal; the caller issues the
    /// refund only on `true`, which makes the refund exactly-once.
    async fn fail(&self, id: TaskId, error: &str, now: DateTime<Utc>) -> AppResult<bool>;

    /// Guarded `processing → retrying`: increments `retry_count` and arms
    /// the backoff delay. Returns `false` when the task left `processing`.
    async fn set_retrying(
        &self,
        id: TaskId,
        retry_after_seconds: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;
}

/// Atomic token balance mutations plus the append-only audit trail.
///
/// `spend` and `credit` are the only balance mutation entrypoints in the
/// whole application.
#[async_trait]
pub trait TokenLedger: Send + Sync + std::fmt::Debug + 'static {
    /// Atomic conditional debit: succeeds only when the balance covers the
    /// entry's amount, and records the entry. Returns `false` on
    /// insufficient balance (no partial effect).
    async fn spend(&self, entry: &LedgerEntry) -> AppResult<bool>;

    /// Atomic credit; creates the balance row when absent, and records the
    /// entry. Returns `false` when the entry carries an idempotency
    /// `reference` that was already recorded (duplicate webhook delivery).
    async fn credit(&self, entry: &LedgerEntry) -> AppResult<bool>;

    /// Current balance for a user (0 when no balance row exists).
    async fn balance(&self, user_id: UserId) -> AppResult<i64>;

    /// Ledger entries for a user, newest first.
    async fn history(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LedgerEntry>>;
}

/// Persistence operations for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a notification.
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    /// A user's notifications, newest first.
    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count of unread notifications.
    async fn unread_count(&self, user_id: UserId) -> AppResult<i64>;

    /// Mark one notification read. Returns `false` when it does not exist
    /// or belongs to another user.
    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;
}
