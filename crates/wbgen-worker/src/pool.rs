//! Orchestrator pool: the scheduler seam's worker-side implementation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_core::types::id::JobId;

use crate::orchestrator::JobOrchestrator;

/// Spawns one supervised orchestrator task per scheduled job.
///
/// Scheduling is fire-and-forget: the spawned task's lifetime is detached
/// from the caller's request. On shutdown, running orchestrators are
/// abandoned mid-flight and the reclaimer resumes their jobs after restart.
#[derive(Debug)]
pub struct OrchestratorPool {
    orchestrator: Arc<JobOrchestrator>,
    shutdown: watch::Receiver<bool>,
}

impl OrchestratorPool {
    /// Creates a pool over a shared orchestrator and a shutdown signal.
    pub fn new(orchestrator: Arc<JobOrchestrator>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            orchestrator,
            shutdown,
        }
    }
}

impl JobScheduler for OrchestratorPool {
    fn schedule(&self, job_id: JobId) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let mut shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tokio::select! {
                result = orchestrator.run(job_id) => {
                    if let Err(e) = result {
                        error!(%job_id, error = %e, "Orchestrator failed");
                    }
                }
                _ = shutdown.wait_for(|stop| *stop) => {
                    info!(%job_id, "Abandoning job for shutdown; the reclaimer will resume it");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::{scripted, TestEnv};
    use std::time::Duration;
    use wbgen_entity::job::JobStatus;

    #[tokio::test]
    async fn test_scheduled_job_runs_in_background() {
        let env = TestEnv::new(10).await;
        let job = env.create_job(1).await;
        env.provider.push(scripted::ok());

        let (_stop_tx, stop_rx) = watch::channel(false);
        let pool = OrchestratorPool::new(env.orchestrator.clone(), stop_rx);
        pool.schedule(job.id);

        // Poll until the detached orchestrator finishes.
        for _ in 0..100 {
            if env.job(job.id).await.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(env.job(job.id).await.status, JobStatus::Completed);
    }
}
