//! User notification service.

use std::sync::Arc;

use tracing::warn;

use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::types::id::{NotificationId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_database::traits::NotificationStore;
use wbgen_entity::notification::{Notification, Severity};

/// Manages user notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Fire-and-forget notify. Storage failures are logged and swallowed;
    /// a notification must never roll back job or task state.
    pub async fn notify_best_effort(
        &self,
        user_id: UserId,
        title: &str,
        message: &str,
        severity: Severity,
    ) {
        let notification = Notification {
            id: NotificationId::new(),
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            severity,
            is_read: false,
            read_at: None,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.store.insert(&notification).await {
            warn!(%user_id, title, error = %e, "Failed to deliver notification");
        }
    }

    /// Lists a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.store.find_by_user(user_id, page).await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<i64> {
        self.store.unread_count(user_id).await
    }

    /// Marks a notification as read. Returns `false` when it does not exist,
    /// is already read, or belongs to another user.
    pub async fn mark_read(&self, id: NotificationId, user_id: UserId) -> AppResult<bool> {
        self.store.mark_read(id, user_id, self.clock.now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbgen_core::traits::clock::SystemClock;
    use wbgen_database::memory::MemoryNotificationStore;

    #[tokio::test]
    async fn test_notify_then_mark_read() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = NotificationService::new(store, Arc::new(SystemClock));
        let user = UserId::new();

        service
            .notify_best_effort(user, "Generation complete", "All cards ready", Severity::Info)
            .await;

        let page = service.list(user, &PageRequest::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(service.unread_count(user).await.unwrap(), 1);

        let id = page.items[0].id;
        assert!(service.mark_read(id, user).await.unwrap());
        assert_eq!(service.unread_count(user).await.unwrap(), 0);
    }
}
