//! # Domain Types
//!
//! Core domain types used throughout Reef POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog            Ledger                  Reconciliation             │
//! │  ───────            ──────                  ──────────────             │
//! │  Product            Transaction             InventoryEvent             │
//! │  BundleComponent    TransactionLine         DailyReport                │
//! │  Wholesaler         ReturnEvent/Line        MonthlyStatement           │
//! │  Customer           GiftCardPayment                                    │
//! │  GiftCard           CartLine (ephemeral)                               │
//! │  Promotion                                                              │
//! │  LoyaltyTier        PurchaseOrder/Line                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A transaction line freezes the product's id, name, unit price, and
//! wholesale price at commit time. The transaction stays truthful even if
//! the catalog is edited afterwards, and report profit does not drift.
//!
//! ## Row Shape
//! Structs that map to database rows keep flat `*_laari: i64` fields with
//! `Money` helper methods, so the persistence layer can derive row mapping
//! while all arithmetic goes through [`Money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product & Bundles
// =============================================================================

/// A product available for sale.
///
/// A product may be a *bundle*: a sellable composition of other products.
/// A bundle's own `stock` column is ignored; its effective stock is derived
/// from component stock on every read (see [`crate::stock::effective_stock`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the till and on receipts.
    pub name: String,

    /// Category label (free-form, used for browsing and seed data).
    pub category: String,

    /// Retail price in laari.
    pub price_laari: i64,

    /// Wholesale (cost) price in laari, used for profit reporting.
    pub wholesale_price_laari: i64,

    /// Current stock level. Ignored for bundles.
    pub stock: i64,

    /// Whether this product is a bundle of other products.
    pub is_bundle: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the retail price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_laari(self.price_laari)
    }

    /// Returns the wholesale price as a Money type.
    #[inline]
    pub fn wholesale_price(&self) -> Money {
        Money::from_laari(self.wholesale_price_laari)
    }
}

/// One component of a bundle: `quantity` units of `component_id` per bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BundleComponent {
    pub bundle_id: String,
    pub component_id: String,
    pub quantity: i64,
}

/// A wholesaler that purchase orders are raised against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Wholesaler {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with credit and loyalty state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Per-customer credit ceiling in laari. `None` falls back to the
    /// configured default credit limit.
    pub max_credit_limit_laari: Option<i64>,

    /// Gate for new credit sales. Set by overdue escalation, cleared once
    /// all overdue statements are settled.
    pub credit_blocked: bool,

    /// Accumulated loyalty points.
    pub loyalty_points: i64,

    /// Current loyalty tier, if the customer has reached one.
    pub loyalty_tier_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the customer's credit limit, falling back to `default_limit`.
    pub fn credit_limit(&self, default_limit: Money) -> Money {
        self.max_credit_limit_laari
            .map(Money::from_laari)
            .unwrap_or(default_limit)
    }
}

// =============================================================================
// Cart (ephemeral, pre-commit)
// =============================================================================

/// A line in the till's cart: a product snapshot plus quantity.
///
/// ## Price Freezing
/// The prices are captured when the line is built. If the catalog changes
/// before commit, the cart keeps the prices the customer was quoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Retail price in laari at time of adding (frozen).
    pub unit_price_laari: i64,

    /// Wholesale price in laari at time of adding (frozen).
    pub wholesale_price_laari: i64,

    /// Quantity in the cart.
    pub quantity: i64,
}

impl CartLine {
    /// Creates a cart line from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_laari: product.price_laari,
            wholesale_price_laari: product.wholesale_price_laari,
            quantity,
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        Money::from_laari(self.unit_price_laari).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Payment Status & Method
// =============================================================================

/// Settlement state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Settled in full at the till.
    Paid,
    /// Credit sale; counts towards the customer's outstanding balance.
    Unpaid,
    /// Flagged for back-office review.
    Review,
}

/// How a transaction was (or will be) settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Fully covered by a gift card.
    GiftCard,
    /// Credit sale, settled later against a monthly statement.
    Credit,
    /// Mixed tender: gift card plus another method.
    Multiple,
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale.
///
/// ## Immutability
/// Lines, subtotal, discount, and total are frozen at commit. Only
/// `payment_status`, `payment_method`, and appended return events may change
/// afterwards. Transactions are never deleted; returns and settlement are
/// layered on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub customer_id: String,
    pub subtotal_laari: i64,
    pub discount_laari: i64,
    /// Code of the promotion applied, if any.
    pub promotion_code: Option<String>,
    pub total_laari: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_laari(self.subtotal_laari)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_laari(self.discount_laari)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_laari(self.total_laari)
    }
}

/// A line item in a transaction.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in laari at time of sale (frozen).
    pub unit_price_laari: i64,
    /// Wholesale price in laari at time of sale (frozen).
    pub wholesale_price_laari: i64,
    /// Quantity sold.
    pub quantity: i64,
}

impl TransactionLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_laari(self.unit_price_laari)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// A gift-card payment recorded against a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GiftCardPayment {
    pub id: String,
    pub transaction_id: String,
    pub card_id: String,
    pub amount_laari: i64,
}

impl GiftCardPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_laari(self.amount_laari)
    }
}

/// A full transaction payload: header, lines, and gift-card payments.
///
/// This is the unit the offline queue buffers and the canonical store
/// accepts, so a queued sale carries everything needed to persist it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
    pub gift_card_payments: Vec<GiftCardPayment>,
}

// =============================================================================
// Returns
// =============================================================================

/// One return event appended to a transaction.
///
/// A transaction can accumulate several of these; validation is always
/// against the cumulative quantities across all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnEvent {
    pub id: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// One returned line within a return event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReturnLine {
    pub id: String,
    pub return_event_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub reason: String,
}

/// A requested return line, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestLine {
    pub product_id: String,
    pub quantity: i64,
    pub reason: String,
}

// =============================================================================
// Inventory Audit Trail
// =============================================================================

/// What caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InventoryEventType {
    Sale,
    Return,
    Purchase,
    Adjustment,
}

/// An immutable audit record of a single stock change.
///
/// Append-only: the running sum of `quantity_change` per product
/// reconstructs its stock history. Every stock mutation in the system
/// produces exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryEvent {
    pub id: String,
    pub product_id: String,
    pub event_type: InventoryEventType,
    /// Signed stock delta (negative for deductions).
    pub quantity_change: i64,
    pub created_at: DateTime<Utc>,
    /// The transaction / purchase order that caused this change, if any.
    pub related_id: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Gift Cards
// =============================================================================

/// A prepaid balance redeemable against future transactions.
///
/// `current_balance_laari` never goes negative and never increases after
/// issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GiftCard {
    /// The card code; doubles as the identifier.
    pub id: String,
    pub initial_balance_laari: i64,
    pub current_balance_laari: i64,
    pub is_enabled: bool,
    pub customer_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GiftCard {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_laari(self.current_balance_laari)
    }

    /// A card is redeemable while enabled, non-expired, and holding balance.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled
            && self.current_balance_laari > 0
            && self.expires_at.map(|e| e > now).unwrap_or(true)
    }
}

// =============================================================================
// Promotions
// =============================================================================

/// How a promotion's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    /// `value` is basis points off the subtotal (1000 = 10%).
    Percentage,
    /// `value` is a fixed amount in laari.
    Fixed,
}

/// A discount code applied before any gift card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Promotion {
    pub id: String,
    /// Unique case-insensitively.
    pub code: String,
    pub kind: PromotionKind,
    /// Basis points for percentage promotions, laari for fixed ones.
    pub value: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Promotion {
    /// Discount this promotion grants on `subtotal`, clamped to
    /// `[0, subtotal]` so a fixed discount can never exceed the sale.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.kind {
            PromotionKind::Percentage => subtotal.percentage_bps(self.value.max(0) as u32),
            PromotionKind::Fixed => Money::from_laari(self.value),
        };
        raw.clamp(Money::zero(), subtotal)
    }
}

// =============================================================================
// Loyalty
// =============================================================================

/// A loyalty tier; customers sit in the highest tier whose `min_points`
/// they have reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoyaltyTier {
    pub id: String,
    pub name: String,
    pub min_points: i64,
    /// Earning multiplier in basis points (10000 = ×1.00, 12500 = ×1.25).
    pub point_multiplier_bps: i64,
}

// =============================================================================
// Purchase Orders
// =============================================================================

/// Purchase order lifecycle. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    Pending,
    Processed,
}

/// An order raised against a wholesaler. Processing it receives the stock
/// (through the inventory audit path) and freezes the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub id: String,
    pub wholesaler_id: String,
    pub status: PurchaseOrderStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A line on a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderLine {
    pub id: String,
    pub purchase_order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub purchase_price_laari: i64,
}

// =============================================================================
// Reporting
// =============================================================================

/// Per-method slice of a daily report's payment breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub amount_laari: i64,
}

/// An end-of-day (Z) report.
///
/// The report owns an exact, disjoint partition of transactions: once
/// persisted, its transactions are permanently excluded from every future
/// report's candidate pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub id: String,
    pub report_date: NaiveDate,
    pub total_sales_laari: i64,
    pub total_discounts_laari: i64,
    pub total_returns_value_laari: i64,
    pub net_sales_laari: i64,
    pub total_profit_laari: i64,
    pub payment_breakdown: Vec<MethodTotal>,
    /// Number of transactions partitioned into this report.
    pub transaction_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Monthly statement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StatementStatus {
    Due,
    Paid,
}

/// Overdue escalation state, driven by the periodic time-based check
/// (independent of payment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum OverdueStatus {
    #[serde(rename = "none")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "none"))]
    None,
    #[serde(rename = "7_days_overdue")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "7_days_overdue"))]
    SevenDaysOverdue,
}

/// A per-customer aggregate of unpaid transactions for one billing period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MonthlyStatement {
    pub id: String,
    pub customer_id: String,
    /// Billing period as `YYYY-MM`.
    pub period: String,
    pub total_due_laari: i64,
    pub status: StatementStatus,
    pub overdue_status: OverdueStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MonthlyStatement {
    #[inline]
    pub fn total_due(&self) -> Money {
        Money::from_laari(self.total_due_laari)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(price: i64) -> Product {
        Product {
            id: "p1".into(),
            name: "Roshi Pack".into(),
            category: "BAKERY".into(),
            price_laari: price,
            wholesale_price_laari: price / 2,
            stock: 10,
            is_bundle: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_line_totals() {
        let line = CartLine::from_product(&product(299), 3);
        assert_eq!(line.line_total().laari(), 897);
    }

    #[test]
    fn test_promotion_discount_percentage() {
        let promo = Promotion {
            id: "promo1".into(),
            code: "EID10".into(),
            kind: PromotionKind::Percentage,
            value: 1000,
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(promo.discount_for(Money::from_laari(5000)).laari(), 500);
    }

    #[test]
    fn test_promotion_discount_fixed_clamped() {
        let promo = Promotion {
            id: "promo2".into(),
            code: "FLAT50".into(),
            kind: PromotionKind::Fixed,
            value: 5000,
            is_active: true,
            created_at: Utc::now(),
        };
        // Fixed MVR 50 off a MVR 20 sale clamps to the subtotal.
        assert_eq!(promo.discount_for(Money::from_laari(2000)).laari(), 2000);
    }

    #[test]
    fn test_gift_card_redeemable() {
        let now = Utc::now();
        let mut card = GiftCard {
            id: "GC-1".into(),
            initial_balance_laari: 3000,
            current_balance_laari: 3000,
            is_enabled: true,
            customer_id: None,
            expires_at: None,
            created_at: now,
        };
        assert!(card.is_redeemable(now));

        card.current_balance_laari = 0;
        assert!(!card.is_redeemable(now));

        card.current_balance_laari = 100;
        card.is_enabled = false;
        assert!(!card.is_redeemable(now));

        card.is_enabled = true;
        card.expires_at = Some(now - Duration::days(1));
        assert!(!card.is_redeemable(now));
    }

    #[test]
    fn test_customer_credit_limit_fallback() {
        let mut customer = Customer {
            id: "c1".into(),
            name: "Aishath".into(),
            phone: None,
            max_credit_limit_laari: None,
            credit_blocked: false,
            loyalty_points: 0,
            loyalty_tier_id: None,
            created_at: Utc::now(),
        };
        let default_limit = Money::from_rufiyaa(500);
        assert_eq!(customer.credit_limit(default_limit), default_limit);

        customer.max_credit_limit_laari = Some(100000);
        assert_eq!(customer.credit_limit(default_limit).laari(), 100000);
    }

    #[test]
    fn test_overdue_status_serde_names() {
        let json = serde_json::to_string(&OverdueStatus::SevenDaysOverdue).unwrap();
        assert_eq!(json, "\"7_days_overdue\"");
        let json = serde_json::to_string(&OverdueStatus::None).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
