//! # Error Types
//!
//! The business-rule error taxonomy. [`CoreError`] is what the engines
//! reject with; [`ValidationError`] covers shape problems in the input and
//! folds into it. Persistence failures live in `reef-db::DbError`, and the
//! facade composes both into `reef-ledger::LedgerError` for callers.
//!
//! Every variant carries the context the till needs to phrase a message
//! (product name, remaining credit, returnable quantity). All of these are
//! recoverable; a rejected operation has mutated nothing.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// A commit validates everything up front, so any of these surfacing means
/// no state was written.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The id has no product in the catalog lookup table.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A deduction would drive non-bundle stock negative: selling past the
    /// shelf, a bundle whose components cannot cover the decomposed
    /// quantities (several cart lines may hit one component), or a manual
    /// adjustment below zero.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The customer is blocked from new credit sales.
    #[error("Credit blocked for customer {0}")]
    CreditBlocked(String),

    /// The sale would push the customer past their credit limit.
    ///
    /// `remaining_laari` is the credit still available before this sale,
    /// reported so the till can show how much the customer may still spend.
    #[error("Credit limit exceeded: remaining credit is {remaining_laari} laari")]
    CreditLimitExceeded { remaining_laari: i64 },

    /// A return line is non-positive or exceeds what remains returnable.
    #[error("Invalid return quantity for {product}: requested {requested}, returnable {returnable}")]
    InvalidReturnQuantity {
        product: String,
        requested: i64,
        returnable: i64,
    },

    /// Promotion code not found, inactive, or empty.
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),

    /// Gift card not found, disabled, expired, or empty.
    #[error("Invalid gift card: {0}")]
    InvalidGiftCard(String),

    /// A promotion with this code (case-insensitive) already exists.
    #[error("Promotion code '{0}' already exists")]
    DuplicatePromotionCode(String),

    /// The input failed shape validation before any rule ran.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Shape problems in user input, caught before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A string field exceeds its length cap.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A numeric field is outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A numeric field must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Malformed content (bad code characters, bad `YYYY-MM` period).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result alias used across the engine modules.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
