//! # Repository Implementations
//!
//! One repository per aggregate, each a thin handle over the shared pool.
//!
//! ## Conventions
//! - Plain methods run on the pool and are self-contained.
//! - `*_in` methods take a `&mut SqliteConnection` so the ledger can compose
//!   several repositories into one atomic commit (stock deltas + transaction
//!   + gift card + loyalty all-or-nothing).
//! - Guarded state transitions (`finalize`, balance deductions) use
//!   `rows_affected` checks rather than read-then-write.

pub mod customer;
pub mod gift_card;
pub mod inventory;
pub mod product;
pub mod promotion;
pub mod purchase_order;
pub mod queue;
pub mod report;
pub mod transaction;
