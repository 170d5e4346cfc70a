//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use wbgen_core::types::id::{JobId, UserId};

use super::kind::GenerationKind;
use super::status::JobStatus;

/// One user-initiated generation request comprising multiple tasks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// The owning user. Ownership never transfers.
    pub user_id: UserId,
    /// The kind of asset this job produces.
    pub kind: GenerationKind,
    /// Product name from the job spec.
    pub product_name: String,
    /// Product category.
    pub category: String,
    /// Free-text description / benefits.
    pub description: String,
    /// Ordered blob-store paths of the uploaded source images.
    pub source_images: Json<Vec<String>>,
    /// Number of tasks created for this job. Fixed at creation.
    pub total_count: i32,
    /// Number of completed tasks. Monotonically non-decreasing.
    pub completed_count: i32,
    /// Total token cost debited at creation.
    pub total_cost: i64,
    /// Current job status.
    pub status: JobStatus,
    /// Explanatory message when the outcome is not fully successful.
    pub error_message: Option<String>,
    /// When the orchestrator first picked up the job.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Per-task refund amount: the task's share of the total cost,
    /// rounded up, never less than one token.
    pub fn refund_per_task(&self) -> i64 {
        if self.total_count <= 0 {
            return 1;
        }
        let share = (self.total_cost + self.total_count as i64 - 1) / self.total_count as i64;
        share.max(1)
    }
}

/// Validated input spec for creating a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// The requesting user.
    pub user_id: UserId,
    /// The kind of asset to generate.
    pub kind: GenerationKind,
    /// Product name (≤ 100 chars).
    pub product_name: String,
    /// Product category.
    pub category: String,
    /// Free-text description / benefits.
    pub description: String,
    /// Ordered blob-store paths of uploaded source images (1..=10).
    pub source_images: Vec<String>,
    /// Requested task count.
    pub task_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(total_cost: i64, total_count: i32) -> Job {
        Job {
            id: JobId::new(),
            user_id: UserId::new(),
            kind: GenerationKind::ProductCard,
            product_name: "Mug".to_string(),
            category: "kitchen".to_string(),
            description: String::new(),
            source_images: Json(vec!["u/j/0.png".to_string()]),
            total_count,
            completed_count: 0,
            total_cost,
            status: JobStatus::Pending,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_refund_per_task_even_split() {
        assert_eq!(job(6, 6).refund_per_task(), 1);
    }

    #[test]
    fn test_refund_per_task_rounds_up() {
        assert_eq!(job(7, 6).refund_per_task(), 2);
    }

    #[test]
    fn test_refund_per_task_minimum_one() {
        assert_eq!(job(0, 6).refund_per_task(), 1);
    }
}
