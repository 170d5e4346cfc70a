//! In-memory token ledger.
//!
//! One mutex guards balances, entries, and seen references together so a
//! debit's balance check and its audit entry are a single atomic step,
//! matching the SQL transaction in the PostgreSQL repository.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_core::types::id::UserId;
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::ledger::{LedgerDirection, LedgerEntry};

use crate::traits::TokenLedger;

#[derive(Debug, Default)]
struct LedgerInner {
    balances: HashMap<UserId, i64>,
    entries: Vec<LedgerEntry>,
    seen_references: HashSet<String>,
}

/// In-memory token ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's balance (test/dev helper).
    pub fn set_balance(&self, user_id: UserId, balance: i64) {
        let mut inner = self.inner.lock().expect("ledger lock");
        inner.balances.insert(user_id, balance);
    }
}

#[async_trait]
impl TokenLedger for MemoryLedger {
    async fn spend(&self, entry: &LedgerEntry) -> AppResult<bool> {
        if entry.direction != LedgerDirection::Debit || entry.amount <= 0 {
            return Err(AppError::internal("spend() requires a positive debit entry"));
        }

        let mut inner = self.inner.lock().expect("ledger lock");
        let balance = inner.balances.entry(entry.user_id).or_insert(0);
        if *balance < entry.amount {
            return Ok(false);
        }
        *balance -= entry.amount;
        inner.entries.push(entry.clone());
        Ok(true)
    }

    async fn credit(&self, entry: &LedgerEntry) -> AppResult<bool> {
        if entry.direction != LedgerDirection::Credit || entry.amount <= 0 {
            return Err(AppError::internal(
                "credit() requires a positive credit entry",
            ));
        }

        let mut inner = self.inner.lock().expect("ledger lock");
        if let Some(reference) = &entry.reference {
            if !inner.seen_references.insert(reference.clone()) {
                return Ok(false);
            }
        }
        *inner.balances.entry(entry.user_id).or_insert(0) += entry.amount;
        inner.entries.push(entry.clone());
        Ok(true)
    }

    async fn balance(&self, user_id: UserId) -> AppResult<i64> {
        let inner = self.inner.lock().expect("ledger lock");
        Ok(inner.balances.get(&user_id).copied().unwrap_or(0))
    }

    async fn history(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LedgerEntry>> {
        let inner = self.inner.lock().expect("ledger lock");
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = entries.len() as u64;
        let items = entries
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }
}
