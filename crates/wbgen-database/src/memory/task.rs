//! In-memory task store.
//!
//! Transitions mutate the task under its DashMap shard lock, which gives
//! the same winner-takes-it semantics as the SQL conditional updates.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use wbgen_core::result::AppResult;
use wbgen_core::types::id::{JobId, TaskId};
use wbgen_entity::task::{Task, TaskStatus};

use crate::traits::TaskStore;

/// In-memory task store backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryTaskStore {
    tasks: Arc<DashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create a new store over a shared task map.
    pub fn new(tasks: Arc<DashMap<TaskId, Task>>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_by_id(&self, id: TaskId) -> AppResult<Option<Task>> {
        Ok(self.tasks.get(&id).map(|t| t.clone()))
    }

    async fn find_by_job(&self, job_id: JobId) -> AppResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|entry| entry.job_id == job_id)
            .map(|entry| entry.clone())
            .collect();
        tasks.sort_by_key(|t| t.card_index);
        Ok(tasks)
    }

    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> AppResult<Option<Task>> {
        let Some(mut task) = self.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if !task.is_ready(now) {
            return Ok(None);
        }
        task.status = TaskStatus::Processing;
        task.started_at.get_or_insert(now);
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn complete(
        &self,
        id: TaskId,
        asset_url: &str,
        asset_path: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        if task.status != TaskStatus::Processing {
            return Ok(false);
        }
        task.status = TaskStatus::Completed;
        task.asset_url = Some(asset_url.to_string());
        task.asset_path = Some(asset_path.to_string());
        task.last_error = None;
        task.completed_at = Some(now);
        task.updated_at = now;
        Ok(true)
    }

    async fn fail(&self, id: TaskId, error: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(mut task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        if task.is_terminal() {
            return Ok(false);
        }
        task.status = TaskStatus::Failed;
        task.last_error = Some(error.to_string());
        task.completed_at = Some(now);
        task.updated_at = now;
        Ok(true)
    }

    async fn set_retrying(
        &self,
        id: TaskId,
        retry_after_seconds: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut task) = self.tasks.get_mut(&id) else {
            return Ok(false);
        };
        if task.status != TaskStatus::Processing {
            return Ok(false);
        }
        task.status = TaskStatus::Retrying;
        task.retry_count += 1;
        task.retry_after_seconds = Some(retry_after_seconds);
        task.last_error = Some(error.to_string());
        task.updated_at = now;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wbgen_core::types::id::UserId;
    use wbgen_entity::job::GenerationKind;

    fn new_task(status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(),
            job_id: JobId::new(),
            user_id: UserId::new(),
            card_index: 0,
            kind: GenerationKind::ProductCard,
            status,
            retry_count: 0,
            retry_after_seconds: None,
            last_error: None,
            asset_url: None,
            asset_path: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn store_with(task: Task) -> (MemoryTaskStore, TaskId) {
        let id = task.id;
        let map = Arc::new(DashMap::new());
        map.insert(id, task);
        (MemoryTaskStore::new(map), id)
    }

    #[tokio::test]
    async fn test_claim_wins_once() {
        let (store, id) = store_with(new_task(TaskStatus::Pending));
        let now = Utc::now();

        let first = store.claim(id, now).await.unwrap();
        assert!(first.is_some());

        // Second claim sees the task in processing and loses.
        let second = store.claim(id, now).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_claim_respects_backoff() {
        let mut task = new_task(TaskStatus::Retrying);
        task.retry_after_seconds = Some(20);
        let updated_at = task.updated_at;
        let (store, id) = store_with(task);

        assert!(store
            .claim(id, updated_at + Duration::seconds(5))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .claim(id, updated_at + Duration::seconds(20))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_fail_is_exactly_once() {
        let (store, id) = store_with(new_task(TaskStatus::Processing));
        let now = Utc::now();

        assert!(store.fail(id, "provider_error", now).await.unwrap());
        // Replayed failure path is a no-op.
        assert!(!store.fail(id, "provider_error", now).await.unwrap());
        assert!(!store.complete(id, "url", "path", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_completed_task_is_absorbing() {
        let (store, id) = store_with(new_task(TaskStatus::Processing));
        let now = Utc::now();

        assert!(store.complete(id, "url", "path", now).await.unwrap());
        assert!(!store.fail(id, "late failure", now).await.unwrap());
        assert!(!store.set_retrying(id, 10, "late retry", now).await.unwrap());

        let task = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.asset_url.as_deref(), Some("url"));
    }
}
