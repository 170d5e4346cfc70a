//! Task entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wbgen_core::types::id::{JobId, TaskId, UserId};

use crate::job::kind::GenerationKind;

use super::status::TaskStatus;

/// One unit of generation work within a job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// The job this task belongs to.
    pub job_id: JobId,
    /// The owning user (denormalized from the job for refund paths).
    pub user_id: UserId,
    /// Ordinal position within the job. Display ordering only.
    pub card_index: i32,
    /// The generation kind (selects the prompt template).
    pub kind: GenerationKind,
    /// Current task status.
    pub status: TaskStatus,
    /// Number of retries consumed so far.
    pub retry_count: i32,
    /// Backoff delay in seconds, interpreted relative to `updated_at`:
    /// the task is not ready before `updated_at + retry_after_seconds`.
    pub retry_after_seconds: Option<i64>,
    /// Cause of the most recent failure, if any.
    pub last_error: Option<String>,
    /// Public URL of the generated asset, set on completion.
    pub asset_url: Option<String>,
    /// Blob-store path of the generated asset, set on completion.
    pub asset_path: Option<String>,
    /// When the task was first dispatched.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The instant at which this task becomes eligible for dispatch.
    /// `None` for tasks that are not dispatchable at all.
    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        if !self.status.is_dispatchable() {
            return None;
        }
        match self.retry_after_seconds {
            Some(secs) => Some(self.updated_at + Duration::seconds(secs)),
            None => Some(self.updated_at),
        }
    }

    /// Check whether the task is dispatchable right now.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.ready_at().is_some_and(|at| at <= now)
    }
}
