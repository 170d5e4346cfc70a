//! Job status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a generation job.
///
/// Transitions are monotone: `pending → processing → {completed | failed}`.
/// A job never leaves a terminal state. `completed` may coexist with failed
/// subtasks (partial success); `failed` means zero tasks succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, waiting for the orchestrator's first pickup.
    Pending,
    /// The orchestrator is driving the job's tasks.
    Processing,
    /// Terminal: at least one task succeeded.
    Completed,
    /// Terminal: no task succeeded.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
