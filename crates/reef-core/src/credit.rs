//! # Credit Enforcement Engine
//!
//! Decides whether a credit (unpaid) sale is allowed.
//!
//! ## State Machine
//! ```text
//! OK ──overdue escalation──► BLOCKED ──all overdue settled──► OK
//! ```
//!
//! The gate runs before any mutation: a rejected sale writes nothing.
//! Zero-total transactions (e.g. fully gift-card covered) bypass the gate
//! entirely and are recorded as paid.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settings::PosSettings;
use crate::types::Customer;

/// Credit still available to a customer given their outstanding balance.
///
/// Can be negative when a limit was lowered below the balance already owed.
pub fn remaining_credit(customer: &Customer, outstanding: Money, settings: &PosSettings) -> Money {
    customer.credit_limit(settings.default_credit_limit()) - outstanding
}

/// Gate for a prospective credit sale of `total`.
///
/// 1. A blocked customer is rejected outright.
/// 2. `outstanding + total` must stay within the customer's limit (their
///    own, or the configured default). On rejection the remaining credit
///    is reported so the till can tell the customer what still fits.
pub fn check_credit_sale(
    customer: &Customer,
    outstanding: Money,
    total: Money,
    settings: &PosSettings,
) -> CoreResult<()> {
    if total.is_zero() {
        return Ok(());
    }

    if customer.credit_blocked {
        return Err(CoreError::CreditBlocked(customer.name.clone()));
    }

    let limit = customer.credit_limit(settings.default_credit_limit());
    if outstanding + total > limit {
        return Err(CoreError::CreditLimitExceeded {
            remaining_laari: (limit - outstanding).laari(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(limit: Option<i64>, blocked: bool) -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Hassan".to_string(),
            phone: None,
            max_credit_limit_laari: limit,
            credit_blocked: blocked,
            loyalty_points: 0,
            loyalty_tier_id: None,
            created_at: Utc::now(),
        }
    }

    /// outstanding=300, limit=500: a 150 sale fits, a 250 sale reports
    /// remaining=200.
    #[test]
    fn test_limit_gate() {
        let customer = customer(Some(500_00), false);
        let settings = PosSettings::default();
        let outstanding = Money::from_rufiyaa(300);

        assert!(check_credit_sale(
            &customer,
            outstanding,
            Money::from_rufiyaa(150),
            &settings
        )
        .is_ok());

        let err = check_credit_sale(
            &customer,
            outstanding,
            Money::from_rufiyaa(250),
            &settings,
        )
        .unwrap_err();
        match err {
            CoreError::CreditLimitExceeded { remaining_laari } => {
                assert_eq!(remaining_laari, 200_00);
            }
            other => panic!("expected CreditLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_exactly_at_limit_is_allowed() {
        let customer = customer(Some(500_00), false);
        let settings = PosSettings::default();
        assert!(check_credit_sale(
            &customer,
            Money::from_rufiyaa(300),
            Money::from_rufiyaa(200),
            &settings
        )
        .is_ok());
    }

    #[test]
    fn test_blocked_customer_rejected() {
        let customer = customer(Some(500_00), true);
        let settings = PosSettings::default();
        let err = check_credit_sale(
            &customer,
            Money::zero(),
            Money::from_rufiyaa(10),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::CreditBlocked(_)));
    }

    #[test]
    fn test_zero_total_bypasses_gate_even_when_blocked() {
        let customer = customer(Some(500_00), true);
        let settings = PosSettings::default();
        assert!(check_credit_sale(&customer, Money::zero(), Money::zero(), &settings).is_ok());
    }

    #[test]
    fn test_default_limit_fallback() {
        let customer = customer(None, false);
        let settings = PosSettings::default(); // default limit MVR 500
        let err = check_credit_sale(
            &customer,
            Money::from_rufiyaa(400),
            Money::from_rufiyaa(150),
            &settings,
        )
        .unwrap_err();
        match err {
            CoreError::CreditLimitExceeded { remaining_laari } => {
                assert_eq!(remaining_laari, 100_00);
            }
            other => panic!("expected CreditLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_remaining_credit_can_go_negative() {
        let customer = customer(Some(100_00), false);
        let settings = PosSettings::default();
        let remaining = remaining_credit(&customer, Money::from_rufiyaa(150), &settings);
        assert_eq!(remaining.laari(), -50_00);
    }
}
