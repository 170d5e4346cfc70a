//! # wbgen-database
//!
//! Persistence layer for WBGen. Defines the store traits the services and
//! worker depend on, the PostgreSQL implementations (sqlx), and in-memory
//! implementations used by tests and single-process development setups.
//!
//! Every state transition is a single guarded statement (conditional
//! `UPDATE ... WHERE status IN (...)` / compare-and-set) whose row count is
//! the idempotency token for side effects such as refunds.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;
