//! Job creation and read-side use cases.

pub mod service;
pub mod validate;

pub use service::{JobDetails, JobService};
