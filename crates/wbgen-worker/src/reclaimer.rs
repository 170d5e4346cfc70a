//! Stale-job reclaimer.
//!
//! An orchestrator heartbeats its job's `updated_at` every loop iteration.
//! When a process dies mid-job, the heartbeat stops; the reclaimer scans
//! for `processing` jobs whose heartbeat is older than the staleness
//! threshold and re-schedules them. Task-level claims make the re-run safe
//! even if the original orchestrator is somehow still alive.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use wbgen_core::config::worker::WorkerConfig;
use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::traits::scheduler::JobScheduler;
use wbgen_database::traits::JobStore;

/// Periodically re-adopts jobs whose orchestrator died.
#[derive(Debug)]
pub struct Reclaimer {
    jobs: Arc<dyn JobStore>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
    config: WorkerConfig,
}

impl Reclaimer {
    /// Creates a new reclaimer.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            jobs,
            scheduler,
            clock,
            config,
        }
    }

    /// Run the scan loop until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = Duration::from_secs(self.config.reclaim_interval_seconds);
        info!(
            interval_seconds = self.config.reclaim_interval_seconds,
            staleness_seconds = self.config.staleness_threshold_seconds,
            "Reclaimer started"
        );

        loop {
            tokio::select! {
                _ = shutdown.wait_for(|stop| *stop) => {
                    info!("Reclaimer stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            if let Err(e) = self.reclaim_once().await {
                error!(error = %e, "Reclaimer scan failed");
            }
        }
    }

    /// One scan: re-schedule every stale `processing` job.
    pub async fn reclaim_once(&self) -> AppResult<usize> {
        let cutoff = self.clock.now()
            - chrono::Duration::seconds(self.config.staleness_threshold_seconds as i64);
        let stale = self.jobs.find_stale_processing(cutoff).await?;

        for job in &stale {
            warn!(job_id = %job.id, updated_at = %job.updated_at, "Re-adopting stale job");
            self.scheduler.schedule(job.id);
        }

        Ok(stale.len())
    }
}
