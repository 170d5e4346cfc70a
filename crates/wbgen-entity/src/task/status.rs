//! Task status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one generation task.
///
/// `pending --dispatch--> processing --success--> completed`;
/// `processing --retriable error--> retrying --backoff elapsed--> processing`;
/// `processing --terminal error / retries exhausted--> failed`.
/// `completed` and `failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for first dispatch.
    Pending,
    /// An executor owns the task right now.
    Processing,
    /// Waiting out a backoff delay before re-dispatch.
    Retrying,
    /// Terminal: asset generated and stored.
    Completed,
    /// Terminal: gave up; the task's token share was refunded.
    Failed,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the task is eligible for dispatch once its backoff elapses.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Pending | Self::Retrying)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
