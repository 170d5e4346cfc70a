//! Trait seams implemented by the infrastructure crates.

pub mod clock;
pub mod provider;
pub mod scheduler;
pub mod storage;
