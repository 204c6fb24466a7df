//! # Queue Flusher
//!
//! Drains the offline transaction queue into the canonical store.
//!
//! ## Flush Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Queue Flusher Flow                                 │
//! │                                                                         │
//! │  connectivity watch ──(online observed)──► flush()                      │
//! │                                                                         │
//! │  1. Read:   offline_queue, FIFO order                                   │
//! │  2. Append: each record into the canonical transactions store,          │
//! │             one batch, oldest first                                     │
//! │  3. Clear:  delete the flushed queue entries                            │
//! │                                                                         │
//! │  • No de-duplication: ids are client-generated UUIDs                    │
//! │  • Never blocks the till: runs as a background task                     │
//! │  • No deadline: a failed flush is retried on the next online signal     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use reef_db::Database;

use crate::connectivity::ConnectivityWatch;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Flusher
// =============================================================================

/// Background task that flushes the offline queue on reconnect.
pub struct QueueFlusher {
    /// Database handle (queue + canonical transaction store).
    db: Database,

    /// Connectivity flag to observe.
    online: ConnectivityWatch,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running flusher.
#[derive(Clone)]
pub struct QueueFlusherHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl QueueFlusherHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelClosed("Shutdown channel closed".into()))
    }
}

impl QueueFlusher {
    /// Creates a new flusher and its control handle.
    pub fn new(db: Database, online: ConnectivityWatch) -> (Self, QueueFlusherHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let flusher = QueueFlusher {
            db,
            online,
            shutdown_rx,
        };

        (flusher, QueueFlusherHandle { shutdown_tx })
    }

    /// Runs the flusher loop. Spawn this as a background task.
    ///
    /// If the till is already online at startup, any backlog left over
    /// from a previous run is flushed immediately.
    pub async fn run(mut self) {
        info!("Queue flusher starting");

        if *self.online.borrow() {
            if let Err(e) = flush_once(&self.db).await {
                error!(?e, "Startup flush failed");
            }
        }

        loop {
            tokio::select! {
                changed = self.online.changed() => {
                    match changed {
                        Ok(()) => {
                            if *self.online.borrow() {
                                if let Err(e) = flush_once(&self.db).await {
                                    // Left queued; the next online signal
                                    // retries.
                                    error!(?e, "Queue flush failed");
                                }
                            } else {
                                debug!("Connectivity lost, queueing resumes");
                            }
                        }
                        Err(_) => {
                            info!("Connectivity channel closed, flusher stopping");
                            break;
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Queue flusher shutting down");
                    break;
                }
            }
        }

        info!("Queue flusher stopped");
    }
}

/// Drains the queue FIFO into the canonical transaction store, then clears
/// the flushed entries.
///
/// Safe to call directly (the ledger does so for a manual "sync now").
/// Entries are removed one by one as they land, so a failure mid-batch
/// keeps the unflushed tail queued for the next attempt.
pub async fn flush_once(db: &Database) -> SyncResult<usize> {
    let queue = db.offline_queue();
    let pending = queue.pending().await?;

    if pending.is_empty() {
        debug!("Offline queue empty, nothing to flush");
        return Ok(0);
    }

    info!(count = pending.len(), "Flushing offline queue");

    let transactions = db.transactions();
    let mut flushed = 0usize;

    for entry in &pending {
        transactions.insert_record(&entry.record).await?;
        queue.remove(&entry.entry_id).await?;
        flushed += 1;
    }

    info!(flushed, "Offline queue flushed");
    Ok(flushed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityHandle;
    use chrono::Utc;
    use reef_db::DbConfig;
    use reef_core::types::{
        Customer, PaymentMethod, PaymentStatus, Transaction, TransactionRecord,
    };

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                name: "Aishath".to_string(),
                phone: None,
                max_credit_limit_laari: None,
                credit_blocked: false,
                loyalty_points: 0,
                loyalty_tier_id: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        db
    }

    fn record(id: &str, total: i64) -> TransactionRecord {
        TransactionRecord {
            transaction: Transaction {
                id: id.to_string(),
                customer_id: "c1".to_string(),
                subtotal_laari: total,
                discount_laari: 0,
                promotion_code: None,
                total_laari: total,
                payment_status: PaymentStatus::Paid,
                payment_method: PaymentMethod::Cash,
                created_at: Utc::now(),
            },
            lines: vec![],
            gift_card_payments: vec![],
        }
    }

    #[tokio::test]
    async fn test_flush_once_moves_queue_to_store() {
        let db = setup().await;
        let queue = db.offline_queue();

        queue.enqueue(&record("t1", 1000)).await.unwrap();
        queue.enqueue(&record("t2", 2000)).await.unwrap();

        let flushed = flush_once(&db).await.unwrap();
        assert_eq!(flushed, 2);

        // Queue cleared, canonical store has both, order preserved.
        assert!(queue.is_empty().await.unwrap());
        assert!(db.transactions().get_by_id("t1").await.unwrap().is_some());
        assert!(db.transactions().get_by_id("t2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_flush_once_on_empty_queue_is_noop() {
        let db = setup().await;
        assert_eq!(flush_once(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flusher_drains_on_online_signal() {
        let db = setup().await;
        db.offline_queue().enqueue(&record("t1", 1000)).await.unwrap();

        let (connectivity, watch) = ConnectivityHandle::new();
        let (flusher, handle) = QueueFlusher::new(db.clone(), watch);
        let task = tokio::spawn(flusher.run());

        connectivity.set_online();

        // Wait for the background flush to land.
        for _ in 0..50 {
            if db.offline_queue().is_empty().await.unwrap() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(db.offline_queue().is_empty().await.unwrap());
        assert!(db.transactions().get_by_id("t1").await.unwrap().is_some());

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}
