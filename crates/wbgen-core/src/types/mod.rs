//! Shared domain-neutral types.

pub mod id;
pub mod pagination;
