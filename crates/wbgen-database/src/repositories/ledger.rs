//! Token ledger repository implementation.
//!
//! The balance row is the one piece of truly shared mutable state in the
//! system. Both mutations are single atomic statements: the debit is a
//! conditional decrement (`balance >= amount` in the WHERE clause), the
//! credit an upsert increment. Neither ever reads the balance into
//! application code first.

use async_trait::async_trait;
use sqlx::PgPool;

use wbgen_core::error::{AppError, ErrorKind};
use wbgen_core::result::AppResult;
use wbgen_core::types::id::UserId;
use wbgen_core::types::pagination::{PageRequest, PageResponse};
use wbgen_entity::ledger::{LedgerDirection, LedgerEntry};

use crate::traits::TokenLedger;

/// PostgreSQL repository for token balances and ledger entries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new ledger repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_entry(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        entry: &LedgerEntry,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO ledger_entries (id, user_id, direction, amount, reason, \
             job_id, task_id, reference, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.direction)
        .bind(entry.amount)
        .bind(&entry.reason)
        .bind(entry.job_id)
        .bind(entry.task_id)
        .bind(entry.reference.as_deref())
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert ledger entry", e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl TokenLedger for LedgerRepository {
    async fn spend(&self, entry: &LedgerEntry) -> AppResult<bool> {
        if entry.direction != LedgerDirection::Debit || entry.amount <= 0 {
            return Err(AppError::internal("spend() requires a positive debit entry"));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE token_balances SET balance = balance - $2, updated_at = $3 \
             WHERE user_id = $1 AND balance >= $2",
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to debit balance", e))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(false);
        }

        self.insert_entry(&mut tx, entry).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit debit", e)
        })?;

        Ok(true)
    }

    async fn credit(&self, entry: &LedgerEntry) -> AppResult<bool> {
        if entry.direction != LedgerDirection::Credit || entry.amount <= 0 {
            return Err(AppError::internal(
                "credit() requires a positive credit entry",
            ));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Duplicate external references (e.g. replayed payment webhooks)
        // are absorbed by the unique index on ledger_entries.reference.
        if entry.reference.is_some() {
            let inserted = sqlx::query(
                "INSERT INTO ledger_entries (id, user_id, direction, amount, reason, \
                 job_id, task_id, reference, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (reference) DO NOTHING",
            )
            .bind(entry.id)
            .bind(entry.user_id)
            .bind(entry.direction)
            .bind(entry.amount)
            .bind(&entry.reason)
            .bind(entry.job_id)
            .bind(entry.task_id)
            .bind(entry.reference.as_deref())
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert ledger entry", e)
            })?;

            if inserted.rows_affected() == 0 {
                tx.rollback().await.ok();
                return Ok(false);
            }
        } else {
            self.insert_entry(&mut tx, entry).await?;
        }

        sqlx::query(
            "INSERT INTO token_balances (user_id, balance, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE \
             SET balance = token_balances.balance + EXCLUDED.balance, updated_at = $3",
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to credit balance", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit credit", e)
        })?;

        Ok(true)
    }

    async fn balance(&self, user_id: UserId) -> AppResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM token_balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read balance", e)
                })?;

        Ok(balance.unwrap_or(0))
    }

    async fn history(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<LedgerEntry>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count entries", e)
                })?;

        let entries = sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM ledger_entries WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list entries", e))?;

        Ok(PageResponse::new(
            entries,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}
