//! # Connectivity Signal
//!
//! A `watch`-channel backed online/offline flag shared by the ledger (which
//! decides between the canonical store and the offline queue at commit
//! time) and the flusher (which wakes on every transition to online).
//!
//! Whoever integrates the till wires real network probes (or a manual
//! toggle) into [`ConnectivityHandle::set_online`]; the engine only ever
//! observes the flag.

use tokio::sync::watch;

/// Write side of the connectivity flag.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    tx: watch::Sender<bool>,
}

/// Read side of the connectivity flag.
pub type ConnectivityWatch = watch::Receiver<bool>;

impl ConnectivityHandle {
    /// Creates the flag, initially offline.
    pub fn new() -> (Self, ConnectivityWatch) {
        Self::with_initial(false)
    }

    /// Creates the flag with an explicit initial state.
    pub fn with_initial(online: bool) -> (Self, ConnectivityWatch) {
        let (tx, rx) = watch::channel(online);
        (ConnectivityHandle { tx }, rx)
    }

    /// Signals that connectivity is available. Idempotent; every call
    /// notifies watchers, so re-announcing `online` re-triggers a flush
    /// (which is how retries happen).
    pub fn set_online(&self) {
        let _ = self.tx.send(true);
    }

    /// Signals that connectivity was lost.
    pub fn set_offline(&self) {
        let _ = self.tx.send(false);
    }

    /// Current state.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another read handle.
    pub fn watch(&self) -> ConnectivityWatch {
        self.tx.subscribe()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_are_observed() {
        let (handle, mut watch) = ConnectivityHandle::new();
        assert!(!*watch.borrow());
        assert!(!handle.is_online());

        handle.set_online();
        watch.changed().await.unwrap();
        assert!(*watch.borrow());
        assert!(handle.is_online());

        handle.set_offline();
        watch.changed().await.unwrap();
        assert!(!*watch.borrow());
    }
}
