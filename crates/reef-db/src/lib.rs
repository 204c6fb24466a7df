//! # reef-db: Database Layer for Reef POS
//!
//! SQLite persistence for the ledger, built on sqlx. A [`Database`] handle
//! wraps the connection pool and hands out one repository per aggregate;
//! the schema is embedded and migrated on connect.
//!
//! - [`pool`] - pool configuration and the [`Database`] handle
//! - [`migrations`] - embedded schema migrations
//! - [`error`] - [`DbError`] and the sqlx error mapping
//! - [`repository`] - the per-aggregate repositories
//!
//! ```rust,ignore
//! use reef_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/reef.db")).await?;
//! let products = db.products().search("tuna", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::gift_card::GiftCardRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;
pub use repository::purchase_order::PurchaseOrderRepository;
pub use repository::queue::{OfflineQueueRepository, QueuedTransaction};
pub use repository::report::ReportRepository;
pub use repository::transaction::TransactionRepository;
