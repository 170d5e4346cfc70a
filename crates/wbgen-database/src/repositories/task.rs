//! Task repository implementation.
//!
//! Every transition here is a single conditional `UPDATE`; the row count
//! tells the caller whether it won the transition. Terminal states are
//! absorbing by construction: no `WHERE` clause matches a completed or
//! failed task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wbgen_core::error::{AppError, ErrorKind};
use wbgen_core::result::AppResult;
use wbgen_core::types::id::{JobId, TaskId};
use wbgen_entity::task::Task;

use crate::traits::TaskStore;

/// PostgreSQL repository for generation tasks.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Create a new task repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<Task>> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find task", e))
    }

    async fn find_by_job(&self, job_id: JobId) -> AppResult<Vec<Task>> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE job_id = $1 ORDER BY card_index ASC")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tasks", e))
    }

    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> AppResult<Option<Task>> {
        sqlx::query_as::<_, Task>(
            "UPDATE tasks SET status = 'processing', \
             started_at = COALESCE(started_at, $2), updated_at = $2 \
             WHERE id = $1 AND status IN ('pending', 'retrying') \
             AND (retry_after_seconds IS NULL \
                  OR updated_at + make_interval(secs => retry_after_seconds) <= $2) \
             RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim task", e))
    }

    async fn complete(
        &self,
        id: TaskId,
        asset_url: &str,
        asset_path: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'completed', asset_url = $2, asset_path = $3, \
             last_error = NULL, completed_at = $4, updated_at = $4 \
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(id)
        .bind(asset_url)
        .bind(asset_path)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete task", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail(&self, id: TaskId, error: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'failed', last_error = $2, completed_at = $3, \
             updated_at = $3 WHERE id = $1 AND status NOT IN ('completed', 'failed')",
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fail task", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_retrying(
        &self,
        id: TaskId,
        retry_after_seconds: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'retrying', retry_count = retry_count + 1, \
             retry_after_seconds = $2, last_error = $3, updated_at = $4 \
             WHERE id = $1 AND status = 'processing'",
        )
        .bind(id)
        .bind(retry_after_seconds)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to set task retrying", e)
        })?;

        Ok(result.rows_affected() == 1)
    }
}
