//! # reef-sync: Offline Queue & Connectivity for Reef POS
//!
//! While the till is disconnected, committed transactions are buffered in
//! a durable local queue (owned by reef-db). This crate provides:
//!
//! - [`connectivity`] - the shared online/offline watch flag
//! - [`flusher`] - the background task that drains the queue FIFO into the
//!   canonical transaction store whenever the till comes back online
//!
//! ## Guarantees (and non-guarantees)
//!
//! - Flushing preserves FIFO order and runs as one batch per signal.
//! - No de-duplication or conflict detection: transaction ids are
//!   client-generated UUIDs, so a double-queued sale persists twice.
//! - No deadline: a failed flush stays queued and retries on the next
//!   `online` signal.

pub mod connectivity;
pub mod error;
pub mod flusher;

pub use connectivity::{ConnectivityHandle, ConnectivityWatch};
pub use error::{SyncError, SyncResult};
pub use flusher::{flush_once, QueueFlusher, QueueFlusherHandle};
