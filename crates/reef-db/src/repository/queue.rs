//! # Offline Queue Repository
//!
//! The durable buffer for transactions committed while disconnected.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offline_queue table                                                    │
//! │                                                                         │
//! │  id        | payload (full TransactionRecord JSON) | created_at         │
//! │  ──────────┼───────────────────────────────────────┼──────────────      │
//! │  q-001     | { transaction, lines, payments }      | 10:01:07           │
//! │  q-002     | { transaction, lines, payments }      | 10:04:55           │
//! │                                                                         │
//! │  • append-only while offline                                            │
//! │  • drained FIFO (created_at, then insertion order) on reconnect         │
//! │  • no de-duplication: ids are client-generated UUIDs                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use reef_core::types::TransactionRecord;

/// A queued transaction with its queue entry id.
#[derive(Debug, Clone)]
pub struct QueuedTransaction {
    pub entry_id: String,
    pub record: TransactionRecord,
}

/// Repository for the offline transaction queue.
#[derive(Debug, Clone)]
pub struct OfflineQueueRepository {
    pool: SqlitePool,
}

impl OfflineQueueRepository {
    /// Creates a new OfflineQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfflineQueueRepository { pool }
    }

    /// Appends a committed transaction to the queue.
    pub async fn enqueue(&self, record: &TransactionRecord) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Self::enqueue_in(&mut conn, record).await
    }

    /// Connection-scoped append, so an offline commit's queue entry lands
    /// in the same transaction as its stock and loyalty writes.
    pub async fn enqueue_in(
        conn: &mut SqliteConnection,
        record: &TransactionRecord,
    ) -> DbResult<String> {
        let entry_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(record)?;
        let now = Utc::now();

        debug!(
            entry_id = %entry_id,
            transaction_id = %record.transaction.id,
            "Queueing offline transaction"
        );

        sqlx::query("INSERT INTO offline_queue (id, payload, created_at) VALUES (?1, ?2, ?3)")
            .bind(&entry_id)
            .bind(payload)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        Ok(entry_id)
    }

    /// Reads the whole queue in FIFO order.
    pub async fn pending(&self) -> DbResult<Vec<QueuedTransaction>> {
        let rows = sqlx::query(
            "SELECT id, payload FROM offline_queue ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry_id: String = row.try_get("id")?;
            let payload: String = row.try_get("payload")?;
            let record: TransactionRecord = serde_json::from_str(&payload)?;
            entries.push(QueuedTransaction { entry_id, record });
        }

        Ok(entries)
    }

    /// Number of queued transactions.
    pub async fn len(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offline_queue")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// True when the queue is empty.
    pub async fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Removes one flushed entry.
    pub async fn remove(&self, entry_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM offline_queue WHERE id = ?1")
            .bind(entry_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clears the whole queue (after a successful batch flush).
    pub async fn clear(&self) -> DbResult<()> {
        sqlx::query("DELETE FROM offline_queue")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use reef_core::types::{
        PaymentMethod, PaymentStatus, Transaction, TransactionRecord,
    };

    fn record(id: &str) -> TransactionRecord {
        TransactionRecord {
            transaction: Transaction {
                id: id.to_string(),
                customer_id: "c1".to_string(),
                subtotal_laari: 1000,
                discount_laari: 0,
                promotion_code: None,
                total_laari: 1000,
                payment_status: PaymentStatus::Paid,
                payment_method: PaymentMethod::Cash,
                created_at: Utc::now(),
            },
            lines: vec![],
            gift_card_payments: vec![],
        }
    }

    #[tokio::test]
    async fn test_fifo_order_preserved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.offline_queue();

        queue.enqueue(&record("t1")).await.unwrap();
        queue.enqueue(&record("t2")).await.unwrap();
        queue.enqueue(&record("t3")).await.unwrap();

        let pending = queue.pending().await.unwrap();
        let ids: Vec<&str> = pending
            .iter()
            .map(|q| q.record.transaction.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.offline_queue();

        // Same logical sale queued twice: both entries persist.
        queue.enqueue(&record("t1")).await.unwrap();
        queue.enqueue(&record("t1")).await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_clear_empties_queue() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.offline_queue();

        queue.enqueue(&record("t1")).await.unwrap();
        assert!(!queue.is_empty().await.unwrap());

        queue.clear().await.unwrap();
        assert!(queue.is_empty().await.unwrap());
    }
}
