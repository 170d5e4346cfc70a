//! # wbgen-service
//!
//! Business logic service layer for WBGen. Each service orchestrates stores,
//! the ledger, and the scheduler to implement application-level use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod job;
pub mod ledger;
pub mod notification;
pub mod settings;

pub use job::{JobDetails, JobService};
pub use ledger::LedgerService;
pub use notification::NotificationService;
pub use settings::settings_for;
