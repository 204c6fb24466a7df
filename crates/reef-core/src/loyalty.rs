//! # Loyalty Engine
//!
//! Points accrual and tier evaluation on transaction commit.
//!
//! ## Earning
//! ```text
//! points = floor(total_mvr × points_per_mvr × tier_multiplier)
//! ```
//! The multiplier comes from the customer's tier *before* this
//! transaction's points are added. All arithmetic is integer basis-point
//! math (10000 bps = ×1.00); the floor falls out of integer division.
//!
//! ## Tiers
//! A customer's tier is the highest tier whose `min_points` they have
//! reached. Re-evaluation after earning may promote, never demote.

use crate::money::Money;
use crate::settings::LoyaltySettings;
use crate::types::{Customer, LoyaltyTier};

/// Neutral multiplier for customers without a tier.
pub const BASE_MULTIPLIER_BPS: i64 = 10000;

/// The outcome of running loyalty accrual for one committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyOutcome {
    pub points_earned: i64,
    pub new_points: i64,
    /// Set only when the customer moved up a tier.
    pub promoted_to: Option<String>,
}

/// Points earned on `total` at `points_per_mvr`, scaled by a basis-point
/// tier multiplier. Widened to i128; the division floors.
pub fn points_earned(total: Money, points_per_mvr: i64, multiplier_bps: i64) -> i64 {
    if total.laari() <= 0 || points_per_mvr <= 0 || multiplier_bps <= 0 {
        return 0;
    }
    // laari → rufiyaa (÷100), bps → factor (÷10000), floored once at the end
    let raw = total.laari() as i128 * points_per_mvr as i128 * multiplier_bps as i128;
    (raw / (100 * 10000)) as i64
}

/// Finds the highest tier whose threshold `points` has reached.
///
/// `tiers` may arrive in any order; ties on `min_points` resolve to the
/// later entry, matching a sorted scan.
pub fn evaluate_tier<'a>(points: i64, tiers: &'a [LoyaltyTier]) -> Option<&'a LoyaltyTier> {
    let mut sorted: Vec<&LoyaltyTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_points);
    sorted
        .into_iter()
        .filter(|t| t.min_points <= points)
        .next_back()
}

/// Runs accrual for one committed transaction (paid or credit).
///
/// Returns `None` when the program is disabled. The tier multiplier is
/// read from the customer's current tier; the tier is then re-evaluated
/// against the new balance, promoting only.
pub fn apply_sale(
    customer: &Customer,
    total: Money,
    tiers: &[LoyaltyTier],
    settings: &LoyaltySettings,
) -> Option<LoyaltyOutcome> {
    if !settings.enabled {
        return None;
    }

    let current_multiplier = customer
        .loyalty_tier_id
        .as_deref()
        .and_then(|id| tiers.iter().find(|t| t.id == id))
        .map(|t| t.point_multiplier_bps)
        .unwrap_or(BASE_MULTIPLIER_BPS);

    let earned = points_earned(total, settings.points_per_mvr, current_multiplier);
    let new_points = customer.loyalty_points + earned;

    let current_min = customer
        .loyalty_tier_id
        .as_deref()
        .and_then(|id| tiers.iter().find(|t| t.id == id))
        .map(|t| t.min_points);

    // Promote only: keep the current tier unless the new one sits higher.
    let promoted_to = evaluate_tier(new_points, tiers)
        .filter(|next| current_min.map(|min| next.min_points > min).unwrap_or(true))
        .map(|next| next.id.clone());

    Some(LoyaltyOutcome {
        points_earned: earned,
        new_points,
        promoted_to,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tiers() -> Vec<LoyaltyTier> {
        vec![
            LoyaltyTier {
                id: "bronze".to_string(),
                name: "Bronze".to_string(),
                min_points: 0,
                point_multiplier_bps: 10000,
            },
            LoyaltyTier {
                id: "silver".to_string(),
                name: "Silver".to_string(),
                min_points: 500,
                point_multiplier_bps: 12500,
            },
        ]
    }

    fn customer(points: i64, tier: Option<&str>) -> Customer {
        Customer {
            id: "c1".to_string(),
            name: "Mariyam".to_string(),
            phone: None,
            max_credit_limit_laari: None,
            credit_blocked: false,
            loyalty_points: points,
            loyalty_tier_id: tier.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_points_earned_floors() {
        // MVR 100 × 1 pt/MVR × 1.00 = 100
        assert_eq!(points_earned(Money::from_rufiyaa(100), 1, 10000), 100);
        // MVR 100 × 1 pt/MVR × 1.25 = 125
        assert_eq!(points_earned(Money::from_rufiyaa(100), 1, 12500), 125);
        // MVR 10.50 × 1 pt/MVR × 1.25 = 13.125 → 13
        assert_eq!(points_earned(Money::from_laari(1050), 1, 12500), 13);
        // zero and negative totals earn nothing
        assert_eq!(points_earned(Money::zero(), 1, 10000), 0);
        assert_eq!(points_earned(Money::from_laari(-100), 1, 10000), 0);
    }

    #[test]
    fn test_evaluate_tier_highest_reached() {
        let tiers = tiers();
        assert_eq!(evaluate_tier(0, &tiers).unwrap().id, "bronze");
        assert_eq!(evaluate_tier(499, &tiers).unwrap().id, "bronze");
        assert_eq!(evaluate_tier(500, &tiers).unwrap().id, "silver");
        assert_eq!(evaluate_tier(10_000, &tiers).unwrap().id, "silver");
        assert!(evaluate_tier(10, &[]).is_none());
    }

    /// The worked example: 450 points in Bronze, MVR 100 sale at 1 pt/MVR
    /// → 100 points earned, 550 total, promoted to Silver.
    #[test]
    fn test_sale_promotes_across_threshold() {
        let customer = customer(450, Some("bronze"));
        let outcome = apply_sale(
            &customer,
            Money::from_rufiyaa(100),
            &tiers(),
            &LoyaltySettings::default(),
        )
        .unwrap();

        assert_eq!(outcome.points_earned, 100);
        assert_eq!(outcome.new_points, 550);
        assert_eq!(outcome.promoted_to.as_deref(), Some("silver"));
    }

    #[test]
    fn test_multiplier_from_tier_before_earning() {
        // A Silver customer earns at ×1.25 on this sale.
        let customer = customer(600, Some("silver"));
        let outcome = apply_sale(
            &customer,
            Money::from_rufiyaa(100),
            &tiers(),
            &LoyaltySettings::default(),
        )
        .unwrap();

        assert_eq!(outcome.points_earned, 125);
        // Already in the highest reached tier: no promotion recorded.
        assert_eq!(outcome.promoted_to, None);
    }

    #[test]
    fn test_untiered_customer_earns_at_base_rate() {
        let customer = customer(0, None);
        let outcome = apply_sale(
            &customer,
            Money::from_rufiyaa(40),
            &tiers(),
            &LoyaltySettings::default(),
        )
        .unwrap();

        assert_eq!(outcome.points_earned, 40);
        // 40 points reaches Bronze (min 0), which counts as a promotion
        // from no tier at all.
        assert_eq!(outcome.promoted_to.as_deref(), Some("bronze"));
    }

    #[test]
    fn test_disabled_program_earns_nothing() {
        let customer = customer(450, Some("bronze"));
        let settings = LoyaltySettings {
            enabled: false,
            points_per_mvr: 1,
        };
        assert!(apply_sale(&customer, Money::from_rufiyaa(100), &tiers(), &settings).is_none());
    }
}
