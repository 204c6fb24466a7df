//! # Validation Module
//!
//! Input validation utilities for Reef POS.
//!
//! Validation runs before any business logic: the engines assume their
//! inputs are shape-valid and only enforce cross-entity rules themselves.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum quantity of a single line, sale or return.
/// Prevents accidental over-entry (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product, customer, or wholesaler display name: non-empty
/// after trimming, at most 200 characters.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a promotion or gift card code: non-empty, at most 32
/// characters, letters/digits/hyphens/underscores only.
///
/// ```rust
/// use reef_core::validation::validate_code;
///
/// assert!(validate_code("EID-10").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a billing period string (`YYYY-MM`).
pub fn validate_period(period: &str) -> ValidationResult<()> {
    let ok = period.len() == 7
        && period.as_bytes()[4] == b'-'
        && period[..4].chars().all(|c| c.is_ascii_digit())
        && period[5..].chars().all(|c| c.is_ascii_digit())
        && matches!(period[5..].parse::<u32>(), Ok(1..=12));

    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "period".to_string(),
            reason: "must be YYYY-MM".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: strictly positive, capped at
/// [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or balance in laari: non-negative, with zero allowed
/// (free items exist).
pub fn validate_amount_laari(laari: i64) -> ValidationResult<()> {
    if laari < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage promotion value in basis points (0..=10000).
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
