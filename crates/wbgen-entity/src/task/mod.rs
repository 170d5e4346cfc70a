//! Generation task entity.

pub mod model;
pub mod status;

pub use model::Task;
pub use status::TaskStatus;
