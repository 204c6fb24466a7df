//! # Ledger Error Type
//!
//! What callers of the engine facade see. Business rule violations arrive
//! as [`CoreError`], persistence failures as [`DbError`]; both are
//! recoverable, and a rejected operation has written nothing.

use thiserror::Error;

use reef_core::{CoreError, ValidationError};
use reef_db::DbError;
use reef_sync::SyncError;

/// Errors returned by the ledger facade.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the operation (credit gate, stock plan,
    /// return validation, promotion/gift-card acceptance).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database operation failed (or a guarded transition matched
    /// nothing).
    #[error(transparent)]
    Db(#[from] DbError),

    /// The offline queue flush failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A sale was requested with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A statement for this customer and period was already generated.
    #[error("Statement already exists for customer {customer_id} in {period}")]
    StatementExists { customer_id: String, period: String },
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
