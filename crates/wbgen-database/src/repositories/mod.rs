//! PostgreSQL repository implementations of the store traits.

pub mod job;
pub mod ledger;
pub mod notification;
pub mod task;
