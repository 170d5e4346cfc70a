//! In-memory store implementations.
//!
//! Used by the test suites and by single-process development setups that
//! run without PostgreSQL. The guarded-transition semantics are identical
//! to the SQL repositories: every transition is a compare-and-set under a
//! shard or store lock, and its boolean result is the idempotency token.

pub mod job;
pub mod ledger;
pub mod notification;
pub mod task;

use std::sync::Arc;

use dashmap::DashMap;

pub use job::MemoryJobStore;
pub use ledger::MemoryLedger;
pub use notification::MemoryNotificationStore;
pub use task::MemoryTaskStore;

/// Create a paired job store and task store sharing the same task map,
/// so `insert_with_tasks` is visible through both.
pub fn memory_stores() -> (MemoryJobStore, MemoryTaskStore) {
    let tasks = Arc::new(DashMap::new());
    let jobs = Arc::new(DashMap::new());
    (
        MemoryJobStore::new(Arc::clone(&jobs), Arc::clone(&tasks)),
        MemoryTaskStore::new(tasks),
    )
}
