//! # reef-core: Pure Business Logic for Reef POS
//!
//! The ledger and reconciliation rules as pure functions: no database, no
//! network, no clocks of its own. `reef-db` persists what these functions
//! decide, and `reef-ledger` orchestrates the two.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reef-ledger   preview_total ─► commit_sale ─► process_return ─► report │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reef-core     money · types · settings · validation                    │
//! │  (this crate)  stock · pricing · credit · loyalty · returns · reporting │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reef-db       SQLite pool, migrations, repositories                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - domain types (Product, Transaction, GiftCard, ...)
//! - [`money`] - integer-laari monetary arithmetic
//! - [`settings`] - the configuration value object threaded into engines
//! - [`error`] - the business-rule error taxonomy
//! - [`validation`] - input shape validation
//! - [`stock`] - derived bundle stock and stock delta planning
//! - [`pricing`] - the promotion-then-gift-card discount pipeline
//! - [`credit`] - the credit sale gate
//! - [`loyalty`] - points accrual and tier evaluation
//! - [`returns`] - cumulative return validation
//! - [`reporting`] - daily report and statement aggregation
//!
//! Everything here is deterministic (timestamps come in as arguments),
//! errors are typed enum variants rather than strings or panics, and every
//! engine validates before the caller writes anything.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod error;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod reporting;
pub mod returns;
pub mod settings;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settings::PosSettings;
pub use stock::Catalog;
pub use types::*;
