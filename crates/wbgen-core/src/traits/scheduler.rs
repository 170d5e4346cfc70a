//! Scheduler seam between job creation and the background worker.

use crate::types::id::JobId;

/// Hands a freshly created job to the background orchestrator pool.
///
/// Implemented in `wbgen-worker`; the job service only knows that scheduling
/// is fire-and-forget and detached from the caller's request lifetime.
pub trait JobScheduler: Send + Sync + std::fmt::Debug + 'static {
    /// Schedule the orchestrator for a job. Must not block.
    fn schedule(&self, job_id: JobId);
}
