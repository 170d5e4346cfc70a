//! # wbgen-core
//!
//! Core crate for WBGen. Contains configuration schemas, typed identifiers,
//! the unified error system, pagination types, and the trait seams the rest
//! of the platform plugs into (blob storage, generation provider, scheduler).
//!
//! This crate has **no** internal dependencies on other WBGen crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
