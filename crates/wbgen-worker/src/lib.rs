//! # wbgen-worker
//!
//! The background generation pipeline: a per-job orchestrator drives tasks
//! through the executor under bounded concurrency and a wall-clock ceiling,
//! and a reclaimer re-adopts jobs whose orchestrator died.

pub mod executor;
pub mod orchestrator;
pub mod pool;
pub mod reclaimer;

#[cfg(test)]
mod support;

pub use executor::{TaskExecutor, TaskOutcome};
pub use orchestrator::JobOrchestrator;
pub use pool::OrchestratorPool;
pub use reclaimer::Reclaimer;
