//! Request handlers.

pub mod health;
pub mod job;
pub mod notification;
pub mod payment;
pub mod token;
