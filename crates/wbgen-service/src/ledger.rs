//! Token ledger service.
//!
//! The only place the application mutates balances. Every mutation goes
//! through `spend` or one of the credit entrypoints, each backed by a
//! single atomic store operation, so "read balance, compute, write
//! balance" never appears in application code.

use std::sync::Arc;

use tracing::info;

use wbgen_core::error::AppError;
use wbgen_core::result::AppResult;
use wbgen_core::traits::clock::Clock;
use wbgen_core::types::id::{JobId, LedgerEntryId, TaskId, UserId};
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_database::traits::TokenLedger;
use wbgen_entity::ledger::{LedgerDirection, LedgerEntry};

/// Manages token balances and the audit trail.
#[derive(Debug, Clone)]
pub struct LedgerService {
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    /// Creates a new ledger service.
    pub fn new(ledger: Arc<dyn TokenLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Debit tokens for a new job. Fails with `InsufficientTokens` when the
    /// balance does not cover the amount; no partial state is created.
    pub async fn spend(
        &self,
        user_id: UserId,
        amount: i64,
        reason: &str,
        job_id: Option<JobId>,
    ) -> AppResult<()> {
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            user_id,
            direction: LedgerDirection::Debit,
            amount,
            reason: reason.to_string(),
            job_id,
            task_id: None,
            reference: None,
            created_at: self.clock.now(),
        };

        if !self.ledger.spend(&entry).await? {
            return Err(AppError::insufficient_tokens(format!(
                "Balance does not cover {amount} tokens"
            )));
        }

        info!(%user_id, amount, reason, "Debited tokens");
        Ok(())
    }

    /// Credit tokens back for a failed or timed-out task. Callers gate this
    /// on a guarded state transition so each task is refunded at most once.
    pub async fn refund(
        &self,
        user_id: UserId,
        amount: i64,
        reason: &str,
        job_id: Option<JobId>,
        task_id: Option<TaskId>,
    ) -> AppResult<()> {
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            user_id,
            direction: LedgerDirection::Credit,
            amount,
            reason: reason.to_string(),
            job_id,
            task_id,
            reference: None,
            created_at: self.clock.now(),
        };

        self.ledger.credit(&entry).await?;
        info!(%user_id, amount, reason, "Refunded tokens");
        Ok(())
    }

    /// Credit purchased tokens from a confirmed payment. The payment id is
    /// the idempotency reference: a replayed webhook delivery returns
    /// `false` and credits nothing.
    pub async fn credit_payment(
        &self,
        user_id: UserId,
        amount: i64,
        payment_reference: &str,
    ) -> AppResult<bool> {
        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            user_id,
            direction: LedgerDirection::Credit,
            amount,
            reason: "payment".to_string(),
            job_id: None,
            task_id: None,
            reference: Some(payment_reference.to_string()),
            created_at: self.clock.now(),
        };

        let credited = self.ledger.credit(&entry).await?;
        if credited {
            info!(%user_id, amount, payment_reference, "Credited purchased tokens");
        } else {
            info!(payment_reference, "Ignored duplicate payment delivery");
        }
        Ok(credited)
    }

    /// Current balance for a user.
    pub async fn balance(&self, user_id: UserId) -> AppResult<i64> {
        self.ledger.balance(user_id).await
    }

    /// Ledger history for a user, newest first.
    pub async fn history(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LedgerEntry>> {
        self.ledger.history(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbgen_core::error::ErrorKind;
    use wbgen_core::traits::clock::SystemClock;
    use wbgen_database::memory::MemoryLedger;

    fn service() -> (Arc<MemoryLedger>, LedgerService) {
        let ledger = Arc::new(MemoryLedger::new());
        let service = LedgerService::new(ledger.clone(), Arc::new(SystemClock));
        (ledger, service)
    }

    #[tokio::test]
    async fn test_spend_insufficient_is_typed_error() {
        let (ledger, service) = service();
        let user = UserId::new();
        ledger.set_balance(user, 2);

        let err = service.spend(user, 5, "job_created", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientTokens);
        assert_eq!(service.balance(user).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_payment_credit_is_idempotent() {
        let (_ledger, service) = service();
        let user = UserId::new();

        assert!(service.credit_payment(user, 50, "pay-1").await.unwrap());
        assert!(!service.credit_payment(user, 50, "pay-1").await.unwrap());
        assert_eq!(service.balance(user).await.unwrap(), 50);
    }
}
