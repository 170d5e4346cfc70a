//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker configuration (orchestrators + stale-job reclaimer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the background worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between reclaimer scans for stale jobs.
    #[serde(default = "default_reclaim_interval")]
    pub reclaim_interval_seconds: u64,
    /// Age in seconds after which a `processing` job with no progress is
    /// considered orphaned and re-adopted.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold_seconds: u64,
    /// Cap applied to orchestrator idle sleeps while tasks are in backoff.
    #[serde(default = "default_max_idle_sleep")]
    pub max_idle_sleep_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reclaim_interval_seconds: default_reclaim_interval(),
            staleness_threshold_seconds: default_staleness_threshold(),
            max_idle_sleep_seconds: default_max_idle_sleep(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reclaim_interval() -> u64 {
    60
}

fn default_staleness_threshold() -> u64 {
    120
}

fn default_max_idle_sleep() -> u64 {
    30
}
