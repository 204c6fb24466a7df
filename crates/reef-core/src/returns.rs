//! # Returns Rules
//!
//! Validation of partial, multi-event returns against a transaction.
//!
//! ## Never Double-Count
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Transaction: 5 × Tuna Can                                              │
//! │                                                                         │
//! │  Return #1:  2 × Tuna Can   → already_returned = 2, returnable = 3      │
//! │  Return #2:  3 × Tuna Can   → already_returned = 5, returnable = 0      │
//! │  Return #3:  1 × Tuna Can   → REJECTED (InvalidReturnQuantity)          │
//! │                                                                         │
//! │  max_returnable = purchased − Σ prior returns, per product              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is all-or-nothing: one bad line rejects the whole request,
//! so a rejected return never restores any stock.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ReturnLine, ReturnRequestLine, TransactionLine};

/// Sums quantities already returned, per product, across all prior return
/// events on a transaction.
pub fn already_returned(prior: &[ReturnLine]) -> HashMap<String, i64> {
    let mut totals: HashMap<String, i64> = HashMap::new();
    for line in prior {
        *totals.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }
    totals
}

/// Quantity still returnable for one product on a transaction.
pub fn max_returnable(lines: &[TransactionLine], prior: &[ReturnLine], product_id: &str) -> i64 {
    let purchased: i64 = lines
        .iter()
        .filter(|l| l.product_id == product_id)
        .map(|l| l.quantity)
        .sum();
    let returned: i64 = prior
        .iter()
        .filter(|l| l.product_id == product_id)
        .map(|l| l.quantity)
        .sum();
    purchased - returned
}

/// True while any line still has returnable quantity. A fully returned
/// transaction can no longer be the target of a return.
pub fn has_returnable_quantity(lines: &[TransactionLine], prior: &[ReturnLine]) -> bool {
    lines
        .iter()
        .any(|l| max_returnable(lines, prior, &l.product_id) > 0)
}

/// Validates a return request against the transaction's lines and all
/// prior return events.
///
/// Every requested line must be positive and fit within what remains
/// returnable, checked cumulatively: two request lines for the same product
/// are checked against their sum. Products never purchased on this
/// transaction have `returnable = 0` and fail the same way.
pub fn validate_return(
    lines: &[TransactionLine],
    prior: &[ReturnLine],
    request: &[ReturnRequestLine],
) -> CoreResult<()> {
    if request.is_empty() {
        return Err(CoreError::InvalidReturnQuantity {
            product: "(none)".to_string(),
            requested: 0,
            returnable: 0,
        });
    }

    let mut requested_totals: HashMap<&str, i64> = HashMap::new();
    for line in request {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidReturnQuantity {
                product: line.product_id.clone(),
                requested: line.quantity,
                returnable: max_returnable(lines, prior, &line.product_id),
            });
        }
        *requested_totals.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
    }

    for (product_id, requested) in requested_totals {
        let returnable = max_returnable(lines, prior, product_id);
        if requested > returnable {
            return Err(CoreError::InvalidReturnQuantity {
                product: product_id.to_string(),
                requested,
                returnable,
            });
        }
    }

    Ok(())
}

/// Value of a validated return at the original sale prices, used when the
/// customer takes store credit instead of cash.
pub fn store_credit_value(lines: &[TransactionLine], request: &[ReturnRequestLine]) -> Money {
    request
        .iter()
        .map(|r| {
            lines
                .iter()
                .find(|l| l.product_id == r.product_id)
                .map(|l| l.unit_price().multiply_quantity(r.quantity))
                .unwrap_or_else(Money::zero)
        })
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
