//! # Sync Error Types

use thiserror::Error;

use reef_db::DbError;

/// Errors from the offline queue flusher.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// A queued payload could not be decoded.
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// A control channel closed unexpectedly.
    #[error("Channel error: {0}")]
    ChannelClosed(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
