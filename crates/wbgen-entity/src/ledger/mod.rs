//! Token ledger entities.

pub mod model;

pub use model::{LedgerDirection, LedgerEntry, TokenBalance};
