//! Job repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wbgen_core::error::{AppError, ErrorKind};
use wbgen_core::result::AppResult;
use wbgen_core::types::id::{JobId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::job::{Job, JobStatus};
use wbgen_entity::task::Task;

use crate::traits::JobStore;

/// PostgreSQL repository for generation jobs.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn insert_with_tasks(&self, job: &Job, tasks: &[Task]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            "INSERT INTO jobs (id, user_id, kind, product_name, category, description, \
             source_images, total_count, completed_count, total_cost, status, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)",
        )
        .bind(job.id)
        .bind(job.user_id)
        .bind(job.kind)
        .bind(&job.product_name)
        .bind(&job.category)
        .bind(&job.description)
        .bind(&job.source_images)
        .bind(job.total_count)
        .bind(job.completed_count)
        .bind(job.total_cost)
        .bind(job.status)
        .bind(job.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert job", e))?;

        for task in tasks {
            sqlx::query(
                "INSERT INTO tasks (id, job_id, user_id, card_index, kind, status, \
                 retry_count, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
            )
            .bind(task.id)
            .bind(task.job_id)
            .bind(task.user_id)
            .bind(task.card_index)
            .bind(task.kind)
            .bind(task.status)
            .bind(task.retry_count)
            .bind(task.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert task", e))?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit job creation", e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))?;

        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list jobs", e))?;

        Ok(PageResponse::new(
            jobs,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn mark_processing(&self, id: JobId, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'processing', started_at = COALESCE(started_at, $2), \
             updated_at = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job processing", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn finish(
        &self,
        id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        if !status.is_terminal() {
            return Err(AppError::internal(format!(
                "finish() called with non-terminal status '{status}'"
            )));
        }

        let result = sqlx::query(
            "UPDATE jobs SET status = $2, error_message = $3, completed_at = $4, \
             updated_at = $4 WHERE id = $1 AND status IN ('pending', 'processing')",
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to finish job", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_completed(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET completed_count = completed_count + 1, updated_at = $2 \
             WHERE id = $1 AND completed_count < total_count",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to increment completed count", e)
        })?;

        Ok(())
    }

    async fn touch(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE jobs SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch job", e))?;

        Ok(())
    }

    async fn find_stale_processing(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'processing' AND updated_at < $1 \
             ORDER BY updated_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find stale jobs", e))
    }
}
