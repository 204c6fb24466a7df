//! # Pricing & Discount Engine
//!
//! Turns a cart, an optional promotion, and an optional gift card into a
//! final total. The application order is fixed and never changes:
//!
//! ```text
//! subtotal ──promotion──► after_promo ──gift card──► total
//!
//! promo_discount      = percentage or fixed, clamped to [0, subtotal]
//! after_promo         = subtotal − promo_discount
//! gift_card_deduction = min(after_promo, card balance)
//! total               = after_promo − gift_card_deduction   (never < 0)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, GiftCard, Promotion};

// =============================================================================
// Price Breakdown
// =============================================================================

/// The result of pricing a cart: every intermediate figure the till and the
/// transaction record need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub promo_discount: Money,
    pub gift_card_deduction: Money,
    pub total: Money,
}

// =============================================================================
// Pricing
// =============================================================================

/// Sums the cart lines (unit price × quantity).
pub fn subtotal(cart: &[CartLine]) -> Money {
    cart.iter().map(CartLine::line_total).sum()
}

/// Prices a cart with the fixed promotion-then-gift-card order.
///
/// The promotion and gift card must already be accepted (see
/// [`accept_promotion`] / [`accept_gift_card`]); this function only does
/// the arithmetic.
pub fn price_cart(
    cart: &[CartLine],
    promotion: Option<&Promotion>,
    gift_card: Option<&GiftCard>,
) -> PriceBreakdown {
    let subtotal = subtotal(cart);

    let promo_discount = promotion
        .map(|p| p.discount_for(subtotal))
        .unwrap_or_else(Money::zero);

    let after_promo = subtotal - promo_discount;

    let gift_card_deduction = gift_card
        .map(|card| after_promo.min(card.balance()))
        .unwrap_or_else(Money::zero);

    PriceBreakdown {
        subtotal,
        promo_discount,
        gift_card_deduction,
        total: after_promo - gift_card_deduction,
    }
}

// =============================================================================
// Acceptance Checks
// =============================================================================

/// Checks that a promotion may be applied: it must be active and its code
/// must match the requested code case-insensitively.
pub fn accept_promotion<'a>(promotion: &'a Promotion, code: &str) -> CoreResult<&'a Promotion> {
    if !promotion.code.eq_ignore_ascii_case(code.trim()) {
        return Err(CoreError::InvalidPromotion(code.trim().to_string()));
    }
    if !promotion.is_active {
        return Err(CoreError::InvalidPromotion(format!(
            "{} is not active",
            promotion.code
        )));
    }
    Ok(promotion)
}

/// Checks that a gift card may be redeemed: enabled, unexpired, balance > 0.
pub fn accept_gift_card<'a>(card: &'a GiftCard, now: DateTime<Utc>) -> CoreResult<&'a GiftCard> {
    if card.is_redeemable(now) {
        Ok(card)
    } else {
        Err(CoreError::InvalidGiftCard(card.id.clone()))
    }
}

/// True when `code` collides case-insensitively with another promotion.
///
/// `editing_id` excludes the promotion being edited so it can keep its own
/// code.
pub fn code_conflicts(code: &str, editing_id: Option<&str>, existing: &[Promotion]) -> bool {
    existing.iter().any(|p| {
        p.code.eq_ignore_ascii_case(code.trim()) && editing_id.map(|id| id != p.id).unwrap_or(true)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
