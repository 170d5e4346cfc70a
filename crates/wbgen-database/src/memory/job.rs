//! In-memory job store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use wbgen_core::result::AppResult;
use wbgen_core::types::id::{JobId, TaskId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::job::{Job, JobStatus};
use wbgen_entity::task::Task;

use crate::traits::JobStore;

/// In-memory job store backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryJobStore {
    jobs: Arc<DashMap<JobId, Job>>,
    tasks: Arc<DashMap<TaskId, Task>>,
}

impl MemoryJobStore {
    /// Create a new store over shared job and task maps.
    pub fn new(jobs: Arc<DashMap<JobId, Job>>, tasks: Arc<DashMap<TaskId, Task>>) -> Self {
        Self { jobs, tasks }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert_with_tasks(&self, job: &Job, tasks: &[Task]) -> AppResult<()> {
        self.jobs.insert(job.id, job.clone());
        for task in tasks {
            self.tasks.insert(task.id, task.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> AppResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|j| j.clone()))
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = jobs.len() as u64;
        let items = jobs
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn mark_processing(&self, id: JobId, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(mut job) = self.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != JobStatus::Pending {
            return Ok(false);
        }
        job.status = JobStatus::Processing;
        job.started_at.get_or_insert(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn finish(
        &self,
        id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut job) = self.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status.is_terminal() {
            return Ok(false);
        }
        job.status = status;
        job.error_message = error_message.map(String::from);
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn increment_completed(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            if job.completed_count < job.total_count {
                job.completed_count += 1;
                job.updated_at = now;
            }
        }
        Ok(())
    }

    async fn touch(&self, id: JobId, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            job.updated_at = now;
        }
        Ok(())
    }

    async fn find_stale_processing(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Job>> {
        let mut stale: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| entry.status == JobStatus::Processing && entry.updated_at < cutoff)
            .map(|entry| entry.clone())
            .collect();
        stale.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(stale)
    }
}
