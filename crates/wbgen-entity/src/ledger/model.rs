//! Token ledger entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use wbgen_core::types::id::{JobId, LedgerEntryId, TaskId, UserId};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LedgerDirection {
    /// Tokens spent (job creation).
    Debit,
    /// Tokens restored (refund) or purchased (payment webhook).
    Credit,
}

impl fmt::Display for LedgerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// One append-only audit record of a balance mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: LedgerEntryId,
    /// The user whose balance changed.
    pub user_id: UserId,
    /// Debit or credit.
    pub direction: LedgerDirection,
    /// Token amount (always positive).
    pub amount: i64,
    /// Machine-readable reason (e.g., `job_created`, `task_failed_refund`).
    pub reason: String,
    /// Related job, if any.
    pub job_id: Option<JobId>,
    /// Related task, if any.
    pub task_id: Option<TaskId>,
    /// External idempotency reference (e.g., payment gateway id).
    pub reference: Option<String>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// Current token balance for a user. Single row per user; every mutation
/// is a single atomic conditional update, never read-modify-write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenBalance {
    /// The user.
    pub user_id: UserId,
    /// Current balance. Never negative.
    pub balance: i64,
    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}
