//! In-memory notification store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use wbgen_core::result::AppResult;
use wbgen_core::types::id::{NotificationId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::notification::Notification;

use crate::traits::NotificationStore;

/// In-memory notification store backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    notifications: Arc<DashMap<NotificationId, Notification>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = notifications.len() as u64;
        let items = notifications
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        Ok(self
            .notifications
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.is_unread())
            .count() as i64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut notification) = self.notifications.get_mut(&id) else {
            return Ok(false);
        };
        if notification.user_id != user_id || notification.is_read {
            return Ok(false);
        }
        notification.is_read = true;
        notification.read_at = Some(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbgen_entity::notification::Severity;

    fn notification(user_id: UserId) -> Notification {
        Notification {
            id: NotificationId::new(),
            user_id,
            title: "Generation complete".to_string(),
            message: "8 of 8 cards are ready".to_string(),
            severity: Severity::Info,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mark_read_is_guarded() {
        let store = MemoryNotificationStore::new();
        let user = UserId::new();
        let n = notification(user);
        store.insert(&n).await.unwrap();

        assert_eq!(store.unread_count(user).await.unwrap(), 1);
        assert!(store.mark_read(n.id, user, Utc::now()).await.unwrap());
        assert!(!store.mark_read(n.id, user, Utc::now()).await.unwrap());
        assert_eq!(store.unread_count(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_rejects_other_user() {
        let store = MemoryNotificationStore::new();
        let owner = UserId::new();
        let n = notification(owner);
        store.insert(&n).await.unwrap();

        assert!(!store.mark_read(n.id, UserId::new(), Utc::now()).await.unwrap());
        assert_eq!(store.unread_count(owner).await.unwrap(), 1);
    }
}
