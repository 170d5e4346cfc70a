//! Per-generation-kind pipeline settings.
//!
//! Each generation kind (product card, product video) runs the same
//! orchestrator control flow with its own cost, retry budget, backoff
//! schedule, concurrency limit, and wall-clock ceiling.

use serde::{Deserialize, Serialize};

/// Delay used when a kind is configured with an empty backoff schedule.
const FALLBACK_RETRY_DELAY_SECONDS: u64 = 30;

/// Pipeline settings for one generation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Token cost per task.
    pub cost_per_task: i64,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff delay in seconds per retry attempt (index = attempt - 1).
    /// The last entry is reused when `max_retries` exceeds its length.
    pub retry_delays_seconds: Vec<u64>,
    /// Maximum tasks dispatched concurrently within one job.
    pub max_concurrency: usize,
    /// Pause between consecutive task dispatches, in milliseconds.
    pub pacing_delay_ms: u64,
    /// Hard wall-clock ceiling per job invocation, in seconds. Work still
    /// non-terminal at the ceiling is force-failed and refunded.
    pub wall_clock_ceiling_seconds: u64,
    /// Maximum task count accepted per job.
    pub max_tasks_per_job: u32,
}

impl GenerationSettings {
    /// Backoff delay for a given attempt number (1-based). Attempts past
    /// the end of the schedule reuse its last entry; an empty schedule
    /// yields a fixed default.
    pub fn retry_delay_seconds(&self, attempt: u32) -> u64 {
        let idx = attempt.max(1) as usize - 1;
        self.retry_delays_seconds
            .get(idx)
            .or_else(|| self.retry_delays_seconds.last())
            .copied()
            .unwrap_or(FALLBACK_RETRY_DELAY_SECONDS)
    }
}

/// Settings per generation kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Product card image generation.
    #[serde(default = "default_product_card")]
    pub product_card: GenerationSettings,
    /// Product video generation.
    #[serde(default = "default_product_video")]
    pub product_video: GenerationSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            product_card: default_product_card(),
            product_video: default_product_video(),
        }
    }
}

fn default_product_card() -> GenerationSettings {
    GenerationSettings {
        cost_per_task: 1,
        max_retries: 3,
        retry_delays_seconds: vec![10, 20, 25],
        max_concurrency: 2,
        pacing_delay_ms: 500,
        wall_clock_ceiling_seconds: 300,
        max_tasks_per_job: 10,
    }
}

fn default_product_video() -> GenerationSettings {
    GenerationSettings {
        cost_per_task: 5,
        max_retries: 2,
        retry_delays_seconds: vec![30, 60],
        max_concurrency: 1,
        pacing_delay_ms: 1000,
        wall_clock_ceiling_seconds: 1800,
        max_tasks_per_job: 3,
    }
}
