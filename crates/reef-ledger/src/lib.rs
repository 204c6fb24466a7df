//! # reef-ledger: Transaction Ledger & Inventory Reconciliation Engine
//!
//! The facade the till (or any other caller) talks to. It threads the pure
//! rules from `reef-core` through the `reef-db` repositories and guarantees
//! the commit discipline the ledger depends on:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Commit Discipline                                │
//! │                                                                         │
//! │  1. VALIDATE   load catalog, plan stock deltas, price the cart,         │
//! │                run the credit gate, all before any write                │
//! │  2. WRITE      one sqlx transaction: stock deltas + audit events        │
//! │                + transaction record (or offline queue entry)            │
//! │                + gift card deduction + loyalty update                   │
//! │  3. NOTIFY     human-readable event on the broadcast channel            │
//! │                                                                         │
//! │  A rejected commit has written nothing. A committed one is durable      │
//! │  with every side effect applied.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sale`] - `preview_total`, `commit_sale`, payment settlement
//! - [`returns`] - partial/multi-event returns with stock restoration
//! - [`inventory`] - stock adjustment, purchase orders, low-stock forecast
//! - [`reports`] - daily (Z-) reports, monthly statements, overdue check
//! - [`catalog`] - product / promotion / gift card administration
//! - [`notify`] - the broadcast notification sink
//! - [`error`] - `LedgerError`, what callers of the facade see

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod reports;
pub mod returns;
pub mod sale;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::{NewBundleComponent, NewProduct, NewPromotion};
pub use error::{LedgerError, LedgerResult};
pub use inventory::{LowStockAlert, NewPurchaseOrderLine};
pub use notify::{Notification, NotificationTopic};
pub use returns::{ProcessedReturn, ReturnRequest};
pub use sale::{SaleLine, SaleRequest, Tender};

use reef_core::settings::PosSettings;
use reef_db::Database;
use reef_sync::{flush_once, ConnectivityWatch};
use tokio::sync::broadcast;
use tracing::info;

use crate::notify::Notifier;

/// The engine handle: database, settings, connectivity, notifications.
///
/// Cheap to clone; all clones share the pool, the connectivity watch, and
/// the notification channel. Settings are an explicit value object so every
/// engine call is a function of its inputs, never of ambient global state.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    settings: PosSettings,
    online: ConnectivityWatch,
    notifier: Notifier,
}

impl Ledger {
    /// Creates a ledger over a database, with the given settings and
    /// connectivity signal.
    pub fn new(db: Database, settings: PosSettings, online: ConnectivityWatch) -> Self {
        Ledger {
            db,
            settings,
            online,
            notifier: Notifier::new(),
        }
    }

    /// The underlying database handle, for direct repository access.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The settings this ledger was configured with.
    pub fn settings(&self) -> &PosSettings {
        &self.settings
    }

    /// Current connectivity as last signalled.
    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Subscribes to the human-readable event stream (the toast sink's
    /// boundary).
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Drains the offline queue into the canonical transaction store now,
    /// without waiting for the next `online` signal.
    pub async fn sync_now(&self) -> LedgerResult<usize> {
        let flushed = flush_once(&self.db).await?;
        if flushed > 0 {
            info!(flushed, "Manual sync flushed offline queue");
            self.notifier.emit(
                NotificationTopic::Sync,
                format!("Synced {flushed} offline transaction(s)"),
            );
        }
        Ok(flushed)
    }
}
