//! Shared application state for handlers.

use std::sync::Arc;

use wbgen_core::config::AppConfig;
use wbgen_service::{JobService, LedgerService, NotificationService};

/// State shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Job creation and read side.
    pub jobs: Arc<JobService>,
    /// Token balances and history.
    pub ledger: Arc<LedgerService>,
    /// User notifications.
    pub notifications: Arc<NotificationService>,
}

impl AppState {
    /// Creates the shared state.
    pub fn new(
        config: Arc<AppConfig>,
        jobs: Arc<JobService>,
        ledger: Arc<LedgerService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            config,
            jobs,
            ledger,
            notifications,
        }
    }
}
