//! # wbgen-entity
//!
//! Domain entity models for WBGen: generation jobs and tasks, the token
//! ledger, and user notifications. Entities are plain data carriers mapped
//! to PostgreSQL rows via `sqlx::FromRow`; all state transition rules live
//! in the repository and worker crates.

pub mod job;
pub mod ledger;
pub mod notification;
pub mod task;
