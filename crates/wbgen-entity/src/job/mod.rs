//! Generation job entity.

pub mod kind;
pub mod model;
pub mod status;

pub use kind::GenerationKind;
pub use model::{Job, JobSpec};
pub use status::JobStatus;
