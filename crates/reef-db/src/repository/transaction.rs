//! # Transaction Repository
//!
//! Database operations for the canonical transaction ledger.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. COMMIT (atomic, via reef-ledger)                                    │
//! │     └── insert_record_in() → header + lines + gift card payments        │
//! │                                                                         │
//! │  2. RETURNS (appended, never rewriting the sale)                        │
//! │     └── append_return_in() → return event + lines                       │
//! │                                                                         │
//! │  3. SETTLEMENT                                                          │
//! │     └── set_payment_status() → unpaid → paid (statement settlement)     │
//! │                                                                         │
//! │  Header amounts and lines are immutable after step 1.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::types::{
    GiftCardPayment, PaymentStatus, ReturnEvent, ReturnLine, Transaction, TransactionLine,
    TransactionRecord,
};

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a full transaction record in its own transaction.
    ///
    /// Used by the offline queue flusher; the live commit path uses
    /// [`Self::insert_record_in`] inside the ledger's commit transaction.
    pub async fn insert_record(&self, record: &TransactionRecord) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_record_in(&mut tx, record).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Connection-scoped insert of header, lines, and gift-card payments.
    pub async fn insert_record_in(
        conn: &mut SqliteConnection,
        record: &TransactionRecord,
    ) -> DbResult<()> {
        let txn = &record.transaction;
        debug!(id = %txn.id, total = %txn.total_laari, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, customer_id, subtotal_laari, discount_laari,
                promotion_code, total_laari, payment_status, payment_method,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&txn.id)
        .bind(&txn.customer_id)
        .bind(txn.subtotal_laari)
        .bind(txn.discount_laari)
        .bind(&txn.promotion_code)
        .bind(txn.total_laari)
        .bind(txn.payment_status)
        .bind(txn.payment_method)
        .bind(txn.created_at)
        .execute(&mut *conn)
        .await?;

        for line in &record.lines {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (
                    id, transaction_id, product_id, name_snapshot,
                    unit_price_laari, wholesale_price_laari, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.transaction_id)
            .bind(&line.product_id)
            .bind(&line.name_snapshot)
            .bind(line.unit_price_laari)
            .bind(line.wholesale_price_laari)
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;
        }

        for payment in &record.gift_card_payments {
            sqlx::query(
                r#"
                INSERT INTO gift_card_payments (id, transaction_id, card_id, amount_laari)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&payment.id)
            .bind(&payment.transaction_id)
            .bind(&payment.card_id)
            .bind(payment.amount_laari)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, customer_id, subtotal_laari, discount_laari,
                   promotion_code, total_laari, payment_status, payment_method,
                   created_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    /// Gets a transaction header by ID, erroring when absent.
    pub async fn require(&self, id: &str) -> DbResult<Transaction> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// Gets the lines of a transaction.
    pub async fn lines_of(&self, transaction_id: &str) -> DbResult<Vec<TransactionLine>> {
        let lines = sqlx::query_as::<_, TransactionLine>(
            r#"
            SELECT id, transaction_id, product_id, name_snapshot,
                   unit_price_laari, wholesale_price_laari, quantity
            FROM transaction_lines
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets the gift-card payments recorded against a transaction.
    pub async fn gift_card_payments_of(
        &self,
        transaction_id: &str,
    ) -> DbResult<Vec<GiftCardPayment>> {
        let payments = sqlx::query_as::<_, GiftCardPayment>(
            r#"
            SELECT id, transaction_id, card_id, amount_laari
            FROM gift_card_payments
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Gets the return events appended to a transaction, oldest first.
    pub async fn return_events_of(&self, transaction_id: &str) -> DbResult<Vec<ReturnEvent>> {
        let events = sqlx::query_as::<_, ReturnEvent>(
            r#"
            SELECT id, transaction_id, created_at
            FROM return_events
            WHERE transaction_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Gets every return line across all of a transaction's return events.
    /// This flattened view is what cumulative return validation consumes.
    pub async fn return_lines_of(&self, transaction_id: &str) -> DbResult<Vec<ReturnLine>> {
        let lines = sqlx::query_as::<_, ReturnLine>(
            r#"
            SELECT rl.id, rl.return_event_id, rl.product_id, rl.quantity, rl.reason
            FROM return_lines rl
            JOIN return_events re ON re.id = rl.return_event_id
            WHERE re.transaction_id = ?1
            ORDER BY re.created_at, rl.id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Connection-scoped append of one return event with its lines.
    pub async fn append_return_in(
        conn: &mut SqliteConnection,
        event: &ReturnEvent,
        lines: &[ReturnLine],
    ) -> DbResult<()> {
        debug!(transaction_id = %event.transaction_id, lines = lines.len(), "Appending return event");

        sqlx::query(
            "INSERT INTO return_events (id, transaction_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&event.id)
        .bind(&event.transaction_id)
        .bind(event.created_at)
        .execute(&mut *conn)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO return_lines (id, return_event_id, product_id, quantity, reason)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(&line.return_event_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(&line.reason)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Outstanding unpaid balance for a customer, in laari.
    pub async fn outstanding_unpaid(&self, customer_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_laari)
            FROM transactions
            WHERE customer_id = ?1 AND payment_status = 'unpaid'
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// A customer's unpaid transactions created within `[start, end)`.
    pub async fn unpaid_in_period(
        &self,
        customer_id: &str,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, customer_id, subtotal_laari, discount_laari,
                   promotion_code, total_laari, payment_status, payment_method,
                   created_at
            FROM transactions
            WHERE customer_id = ?1
              AND payment_status = 'unpaid'
              AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at
            "#,
        )
        .bind(customer_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Sets the payment status of a transaction.
    pub async fn set_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::set_payment_status_in(&mut conn, id, status).await
    }

    /// Connection-scoped payment status transition.
    pub async fn set_payment_status_in(
        conn: &mut SqliteConnection,
        id: &str,
        status: PaymentStatus,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE transactions SET payment_status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Lists recent transactions, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, customer_id, subtotal_laari, discount_laari,
                   promotion_code, total_laari, payment_status, payment_method,
                   created_at
            FROM transactions
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
