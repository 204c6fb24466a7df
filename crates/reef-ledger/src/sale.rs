//! # Sale Preview & Commit
//!
//! Turns a cart into a committed transaction.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VALIDATE (no writes)                                                   │
//! │    load catalog ─► build cart ─► plan stock deltas                      │
//! │    resolve promotion ─► resolve gift card ─► price (promo, then card)   │
//! │    credit gate (unpaid sales only) ─► loyalty outcome                   │
//! │                                                                         │
//! │  WRITE (one sqlx transaction)                                           │
//! │    stock deltas + audit events                                          │
//! │    gift card deduction                                                  │
//! │    transaction record (or offline queue entry while disconnected)       │
//! │    loyalty points / tier promotion                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any rejection leaves the database untouched; any commit applies every
//! side effect or none.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use reef_core::credit::check_credit_sale;
use reef_core::loyalty;
use reef_core::pricing::{self, PriceBreakdown};
use reef_core::stock::{plan_sale_deltas, Catalog};
use reef_core::types::{
    CartLine, GiftCard, GiftCardPayment, InventoryEventType, PaymentMethod, PaymentStatus,
    Promotion, Transaction, TransactionLine, TransactionRecord,
};
use reef_core::validation::validate_quantity;
use reef_core::{CoreError, Money};
use reef_db::{
    CustomerRepository, DbError, GiftCardRepository, InventoryRepository, OfflineQueueRepository,
    TransactionRepository,
};

use crate::error::{LedgerError, LedgerResult};
use crate::notify::NotificationTopic;
use crate::Ledger;

// =============================================================================
// Request Types
// =============================================================================

/// One requested cart line: a product and how many of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// How the remainder (after any gift card) is tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tender {
    Cash,
    Card,
    Transfer,
    /// Credit sale: recorded unpaid and settled against a monthly
    /// statement. Runs the credit gate.
    Credit,
}

/// A sale ready to commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub customer_id: String,
    pub lines: Vec<SaleLine>,
    pub promotion_code: Option<String>,
    pub gift_card_id: Option<String>,
    pub tender: Tender,
}

// =============================================================================
// Preview & Commit
// =============================================================================

impl Ledger {
    /// Prices a cart without committing anything: subtotal, promotion
    /// discount, gift card deduction, total.
    pub async fn preview_total(
        &self,
        lines: &[SaleLine],
        promotion_code: Option<&str>,
        gift_card_id: Option<&str>,
    ) -> LedgerResult<PriceBreakdown> {
        let catalog = self.db().products().load_catalog().await?;
        let cart = build_cart(lines, &catalog)?;
        let promotion = self.resolve_promotion(promotion_code).await?;
        let gift_card = self.resolve_gift_card(gift_card_id).await?;

        Ok(pricing::price_cart(
            &cart,
            promotion.as_ref(),
            gift_card.as_ref(),
        ))
    }

    /// Commits a sale: validates everything, then writes the whole commit
    /// in one database transaction. While offline the record goes to the
    /// durable queue instead of the canonical store; stock, gift card, and
    /// loyalty side effects apply either way.
    pub async fn commit_sale(&self, request: SaleRequest) -> LedgerResult<TransactionRecord> {
        debug!(
            customer_id = %request.customer_id,
            lines = request.lines.len(),
            "Committing sale"
        );

        // Validate phase: nothing below writes.
        let catalog = self.db().products().load_catalog().await?;
        let cart = build_cart(&request.lines, &catalog)?;
        let deltas = plan_sale_deltas(&cart, &catalog)?;

        let promotion = self
            .resolve_promotion(request.promotion_code.as_deref())
            .await?;
        let gift_card = self
            .resolve_gift_card(request.gift_card_id.as_deref())
            .await?;
        let breakdown = pricing::price_cart(&cart, promotion.as_ref(), gift_card.as_ref());

        let customer = self.db().customers().require(&request.customer_id).await?;
        let (payment_status, payment_method) = resolve_tender(request.tender, &breakdown);

        if payment_status == PaymentStatus::Unpaid {
            let outstanding = self.db().transactions().outstanding_unpaid(&customer.id).await?;
            check_credit_sale(
                &customer,
                Money::from_laari(outstanding),
                breakdown.total,
                self.settings(),
            )?;
        }

        let tiers = self.db().customers().list_tiers().await?;
        let loyalty_outcome =
            loyalty::apply_sale(&customer, breakdown.total, &tiers, &self.settings().loyalty);

        // Snapshot the record: lines freeze name and prices at sale time.
        let now = Utc::now();
        let transaction_id = Uuid::new_v4().to_string();
        let record = TransactionRecord {
            transaction: Transaction {
                id: transaction_id.clone(),
                customer_id: customer.id.clone(),
                subtotal_laari: breakdown.subtotal.laari(),
                discount_laari: breakdown.promo_discount.laari(),
                promotion_code: promotion.as_ref().map(|p| p.code.clone()),
                total_laari: breakdown.total.laari(),
                payment_status,
                payment_method,
                created_at: now,
            },
            lines: cart
                .iter()
                .map(|line| TransactionLine {
                    id: Uuid::new_v4().to_string(),
                    transaction_id: transaction_id.clone(),
                    product_id: line.product_id.clone(),
                    name_snapshot: line.name.clone(),
                    unit_price_laari: line.unit_price_laari,
                    wholesale_price_laari: line.wholesale_price_laari,
                    quantity: line.quantity,
                })
                .collect(),
            gift_card_payments: match &gift_card {
                Some(card) if breakdown.gift_card_deduction.is_positive() => {
                    vec![GiftCardPayment {
                        id: Uuid::new_v4().to_string(),
                        transaction_id: transaction_id.clone(),
                        card_id: card.id.clone(),
                        amount_laari: breakdown.gift_card_deduction.laari(),
                    }]
                }
                _ => vec![],
            },
        };

        // Write phase: everything in one database transaction.
        let online = self.is_online();
        let mut tx = self.db().pool().begin().await.map_err(DbError::from)?;

        for delta in &deltas {
            InventoryRepository::apply_delta_in(
                &mut tx,
                &delta.product_id,
                delta.delta,
                InventoryEventType::Sale,
                Some(&transaction_id),
                None,
            )
            .await?;
        }

        if let Some(payment) = record.gift_card_payments.first() {
            GiftCardRepository::deduct_in(&mut tx, &payment.card_id, payment.amount_laari).await?;
        }

        if online {
            TransactionRepository::insert_record_in(&mut tx, &record).await?;
        } else {
            // The full payload (header, lines, gift-card payments) rides in
            // the queue and lands in the canonical store at flush time.
            OfflineQueueRepository::enqueue_in(&mut tx, &record).await?;
        }

        if let Some(outcome) = &loyalty_outcome {
            CustomerRepository::apply_loyalty_in(
                &mut tx,
                &customer.id,
                outcome.new_points,
                outcome.promoted_to.as_deref(),
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %transaction_id,
            total = %breakdown.total,
            ?payment_status,
            ?payment_method,
            online,
            "Sale committed"
        );

        self.notifier.emit(
            NotificationTopic::Sale,
            format!("Sale committed: {}", breakdown.total),
        );
        if let Some(tier_id) = loyalty_outcome.as_ref().and_then(|o| o.promoted_to.as_deref()) {
            self.notifier.emit(
                NotificationTopic::Sale,
                format!("{} promoted to tier {tier_id}", customer.name),
            );
        }
        if !online {
            self.notifier.emit(
                NotificationTopic::Sync,
                "Offline: sale queued for sync".to_string(),
            );
        }

        Ok(record)
    }

    /// Marks a transaction paid (settlement outside a statement, e.g. a
    /// customer clearing a single credit sale at the till).
    pub async fn mark_transaction_paid(&self, transaction_id: &str) -> LedgerResult<()> {
        self.db()
            .transactions()
            .set_payment_status(transaction_id, PaymentStatus::Paid)
            .await?;
        self.notifier
            .emit(NotificationTopic::Credit, "Transaction marked paid");
        Ok(())
    }

    /// Flags a transaction for back-office review.
    pub async fn flag_transaction_for_review(&self, transaction_id: &str) -> LedgerResult<()> {
        self.db()
            .transactions()
            .set_payment_status(transaction_id, PaymentStatus::Review)
            .await?;
        Ok(())
    }

    async fn resolve_promotion(&self, code: Option<&str>) -> LedgerResult<Option<Promotion>> {
        let Some(code) = code else { return Ok(None) };

        let promotion = self
            .db()
            .promotions()
            .get_by_code(code)
            .await?
            .ok_or_else(|| CoreError::InvalidPromotion(code.trim().to_string()))?;
        pricing::accept_promotion(&promotion, code)?;

        Ok(Some(promotion))
    }

    async fn resolve_gift_card(&self, id: Option<&str>) -> LedgerResult<Option<GiftCard>> {
        let Some(id) = id else { return Ok(None) };

        let card = self
            .db()
            .gift_cards()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InvalidGiftCard(id.to_string()))?;
        pricing::accept_gift_card(&card, Utc::now())?;

        Ok(Some(card))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Builds price-frozen cart lines from the request against a fresh catalog.
fn build_cart(lines: &[SaleLine], catalog: &Catalog) -> LedgerResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(LedgerError::EmptyCart);
    }

    let mut cart = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        let product = catalog.require(&line.product_id)?;
        if !product.is_active {
            // A delisted product is gone as far as the till is concerned.
            return Err(CoreError::ProductNotFound(product.id.clone()).into());
        }
        cart.push(CartLine::from_product(product, line.quantity));
    }

    Ok(cart)
}

/// Resolves payment status and method from the tender and the priced cart.
///
/// A total fully covered by the gift card is recorded paid with method
/// `gift_card` and bypasses the credit gate entirely; a partial gift-card
/// cover becomes a `multiple` tender.
fn resolve_tender(tender: Tender, breakdown: &PriceBreakdown) -> (PaymentStatus, PaymentMethod) {
    if breakdown.total.is_zero() && breakdown.gift_card_deduction.is_positive() {
        return (PaymentStatus::Paid, PaymentMethod::GiftCard);
    }

    let method = if breakdown.gift_card_deduction.is_positive() {
        PaymentMethod::Multiple
    } else {
        match tender {
            Tender::Cash => PaymentMethod::Cash,
            Tender::Card => PaymentMethod::Card,
            Tender::Transfer => PaymentMethod::Transfer,
            Tender::Credit => PaymentMethod::Credit,
        }
    };

    let status = match tender {
        Tender::Credit if breakdown.total.is_positive() => PaymentStatus::Unpaid,
        _ => PaymentStatus::Paid,
    };

    (status, method)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reef_core::settings::PosSettings;
    use reef_core::types::{BundleComponent, Customer, LoyaltyTier, Product, PromotionKind};
    use reef_db::{Database, DbConfig};
    use reef_sync::ConnectivityHandle;

    async fn seed(db: &Database) {
        let now = Utc::now();
        let product = |id: &str, name: &str, price: i64, stock: i64, is_bundle: bool| Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "GROCERY".to_string(),
            price_laari: price,
            wholesale_price_laari: price / 2,
            stock,
            is_bundle,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let products = db.products();
        products.insert(&product("roshi", "Roshi Pack", 500, 7, false)).await.unwrap();
        products.insert(&product("tuna", "Tuna Can 185g", 1200, 5, false)).await.unwrap();
        products.insert(&product("voucher", "Meal Voucher", 50_00, 99, false)).await.unwrap();
        products.insert(&product("bundle", "Breakfast Bundle", 2000, 0, true)).await.unwrap();
        products
            .set_components(
                "bundle",
                &[
                    BundleComponent {
                        bundle_id: "bundle".to_string(),
                        component_id: "roshi".to_string(),
                        quantity: 2,
                    },
                    BundleComponent {
                        bundle_id: "bundle".to_string(),
                        component_id: "tuna".to_string(),
                        quantity: 1,
                    },
                ],
            )
            .await
            .unwrap();

        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                name: "Aishath".to_string(),
                phone: None,
                max_credit_limit_laari: Some(500_00),
                credit_blocked: false,
                loyalty_points: 450,
                loyalty_tier_id: Some("bronze".to_string()),
                created_at: now,
            })
            .await
            .unwrap();

        db.customers()
            .insert_tier(&LoyaltyTier {
                id: "bronze".to_string(),
                name: "Bronze".to_string(),
                min_points: 0,
                point_multiplier_bps: 10000,
            })
            .await
            .unwrap();
        db.customers()
            .insert_tier(&LoyaltyTier {
                id: "silver".to_string(),
                name: "Silver".to_string(),
                min_points: 500,
                point_multiplier_bps: 12500,
            })
            .await
            .unwrap();

        db.promotions()
            .insert(&Promotion {
                id: "promo1".to_string(),
                code: "EID10".to_string(),
                kind: PromotionKind::Percentage,
                value: 1000,
                is_active: true,
                created_at: now,
            })
            .await
            .unwrap();

        db.gift_cards()
            .issue(&GiftCard {
                id: "GC-1".to_string(),
                initial_balance_laari: 3000,
                current_balance_laari: 3000,
                is_enabled: true,
                customer_id: Some("c1".to_string()),
                expires_at: None,
                created_at: now,
            })
            .await
            .unwrap();
    }

    async fn ledger(online: bool) -> Ledger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;
        // The write half is dropped: these tests only read the flag.
        let (_handle, watch) = ConnectivityHandle::with_initial(online);
        Ledger::new(db, PosSettings::default(), watch)
    }

    fn request(lines: Vec<SaleLine>, tender: Tender) -> SaleRequest {
        SaleRequest {
            customer_id: "c1".to_string(),
            lines,
            promotion_code: None,
            gift_card_id: None,
            tender,
        }
    }

    fn line(product_id: &str, quantity: i64) -> SaleLine {
        SaleLine {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_commit_deducts_stock_and_stores_snapshot() {
        let ledger = ledger(true).await;

        let record = ledger
            .commit_sale(request(vec![line("tuna", 2)], Tender::Cash))
            .await
            .unwrap();

        assert_eq!(record.transaction.total_laari, 2400);
        assert_eq!(record.transaction.payment_status, PaymentStatus::Paid);
        assert_eq!(record.transaction.payment_method, PaymentMethod::Cash);

        // Stock deducted, snapshot stored, audit trail linked to the sale.
        let tuna = ledger.db().products().require("tuna").await.unwrap();
        assert_eq!(tuna.stock, 3);

        let lines = ledger.db().transactions().lines_of(&record.transaction.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name_snapshot, "Tuna Can 185g");
        assert_eq!(lines[0].unit_price_laari, 1200);

        let events = ledger.db().inventory().events_for_product("tuna", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].quantity_change, -2);
        assert_eq!(events[0].related_id.as_deref(), Some(record.transaction.id.as_str()));
    }

    #[tokio::test]
    async fn test_bundle_sale_deducts_components() {
        let ledger = ledger(true).await;

        ledger
            .commit_sale(request(vec![line("bundle", 1)], Tender::Cash))
            .await
            .unwrap();

        assert_eq!(ledger.db().products().require("roshi").await.unwrap().stock, 5);
        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 4);
    }

    #[tokio::test]
    async fn test_overdrawn_commit_writes_nothing() {
        let ledger = ledger(true).await;

        // 3 bundles need 3 tuna; 3 more direct tuna pushes the aggregate
        // to 6 against 5 in stock.
        let err = ledger
            .commit_sale(request(vec![line("bundle", 3), line("tuna", 3)], Tender::Cash))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { .. })
        ));

        // Nothing moved: stock intact, no transactions, no audit events.
        assert_eq!(ledger.db().products().require("roshi").await.unwrap().stock, 7);
        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 5);
        assert!(ledger.db().transactions().list_recent(10).await.unwrap().is_empty());
        assert!(ledger.db().inventory().events_for_product("tuna", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_gate_uses_outstanding_balance() {
        let ledger = ledger(true).await;

        // MVR 300 already outstanding against a MVR 500 limit.
        ledger
            .commit_sale(request(vec![line("voucher", 6)], Tender::Credit))
            .await
            .unwrap();
        assert_eq!(
            ledger.db().transactions().outstanding_unpaid("c1").await.unwrap(),
            300_00
        );

        // MVR 250 more is over the limit; remaining credit is reported.
        let err = ledger
            .commit_sale(request(vec![line("voucher", 5)], Tender::Credit))
            .await
            .unwrap_err();
        match err {
            LedgerError::Core(CoreError::CreditLimitExceeded { remaining_laari }) => {
                assert_eq!(remaining_laari, 200_00);
            }
            other => panic!("expected CreditLimitExceeded, got {other:?}"),
        }

        // MVR 150 still fits and is recorded unpaid.
        let record = ledger
            .commit_sale(request(vec![line("voucher", 3)], Tender::Credit))
            .await
            .unwrap();
        assert_eq!(record.transaction.payment_status, PaymentStatus::Unpaid);
        assert_eq!(record.transaction.payment_method, PaymentMethod::Credit);
    }

    #[tokio::test]
    async fn test_blocked_customer_cannot_buy_on_credit() {
        let ledger = ledger(true).await;
        ledger.db().customers().set_credit_blocked("c1", true).await.unwrap();

        let err = ledger
            .commit_sale(request(vec![line("voucher", 1)], Tender::Credit))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::CreditBlocked(_))));

        // Paid tenders are unaffected by the block.
        assert!(ledger
            .commit_sale(request(vec![line("voucher", 1)], Tender::Cash))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_gift_card_fully_covering_bypasses_credit_gate() {
        let ledger = ledger(true).await;
        ledger.db().customers().set_credit_blocked("c1", true).await.unwrap();

        // 2 tuna (MVR 24) against a MVR 30 card: total 0, recorded paid
        // even on a credit tender from a blocked customer.
        let mut req = request(vec![line("tuna", 2)], Tender::Credit);
        req.gift_card_id = Some("GC-1".to_string());

        let record = ledger.commit_sale(req).await.unwrap();
        assert_eq!(record.transaction.total_laari, 0);
        assert_eq!(record.transaction.payment_status, PaymentStatus::Paid);
        assert_eq!(record.transaction.payment_method, PaymentMethod::GiftCard);

        let card = ledger.db().gift_cards().require("GC-1").await.unwrap();
        assert_eq!(card.current_balance_laari, 3000 - 2400);
    }

    /// The worked pricing example end to end: subtotal 50.00, 10% promo,
    /// card balance 30.00 → promo 5.00, gift 30.00, total 15.00.
    #[tokio::test]
    async fn test_mixed_tender_applies_promo_then_gift_card() {
        let ledger = ledger(true).await;

        let mut req = request(vec![line("voucher", 1)], Tender::Card);
        req.promotion_code = Some("eid10".to_string());
        req.gift_card_id = Some("GC-1".to_string());

        let record = ledger.commit_sale(req).await.unwrap();
        assert_eq!(record.transaction.subtotal_laari, 50_00);
        assert_eq!(record.transaction.discount_laari, 5_00);
        assert_eq!(record.transaction.total_laari, 15_00);
        assert_eq!(record.transaction.promotion_code.as_deref(), Some("EID10"));
        assert_eq!(record.transaction.payment_method, PaymentMethod::Multiple);

        // The gift-card slice is recorded and the balance is drained.
        let payments = ledger
            .db()
            .transactions()
            .gift_card_payments_of(&record.transaction.id)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_laari, 3000);
        assert_eq!(
            ledger.db().gift_cards().require("GC-1").await.unwrap().current_balance_laari,
            0
        );
    }

    /// The worked loyalty example: 450 points in Bronze, a MVR 100 sale at
    /// 1 point/MVR → 550 points, promoted to Silver.
    #[tokio::test]
    async fn test_loyalty_accrues_and_promotes() {
        let ledger = ledger(true).await;

        ledger
            .commit_sale(request(vec![line("voucher", 2)], Tender::Cash))
            .await
            .unwrap();

        let customer = ledger.db().customers().require("c1").await.unwrap();
        assert_eq!(customer.loyalty_points, 550);
        assert_eq!(customer.loyalty_tier_id.as_deref(), Some("silver"));
    }

    #[tokio::test]
    async fn test_offline_commit_queues_and_syncs_later() {
        let ledger = ledger(false).await;

        let record = ledger
            .commit_sale(request(vec![line("tuna", 1)], Tender::Cash))
            .await
            .unwrap();

        // Stock moved immediately; the record waits in the queue.
        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 4);
        assert_eq!(ledger.db().offline_queue().len().await.unwrap(), 1);
        assert!(ledger
            .db()
            .transactions()
            .get_by_id(&record.transaction.id)
            .await
            .unwrap()
            .is_none());

        // A manual sync lands it in the canonical store.
        assert_eq!(ledger.sync_now().await.unwrap(), 1);
        assert!(ledger
            .db()
            .transactions()
            .get_by_id(&record.transaction.id)
            .await
            .unwrap()
            .is_some());
        assert!(ledger.db().offline_queue().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_preview_writes_nothing() {
        let ledger = ledger(true).await;

        let breakdown = ledger
            .preview_total(&[line("tuna", 2)], Some("EID10"), Some("GC-1"))
            .await
            .unwrap();
        assert_eq!(breakdown.subtotal.laari(), 2400);
        assert_eq!(breakdown.promo_discount.laari(), 240);
        assert_eq!(breakdown.gift_card_deduction.laari(), 2160);
        assert_eq!(breakdown.total.laari(), 0);

        // No stock, balance, or ledger writes happened.
        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 5);
        assert_eq!(
            ledger.db().gift_cards().require("GC-1").await.unwrap().current_balance_laari,
            3000
        );
        assert!(ledger.db().transactions().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_or_inactive_promotion_rejected() {
        let ledger = ledger(true).await;

        let mut req = request(vec![line("tuna", 1)], Tender::Cash);
        req.promotion_code = Some("RAMADAN".to_string());
        assert!(matches!(
            ledger.commit_sale(req).await.unwrap_err(),
            LedgerError::Core(CoreError::InvalidPromotion(_))
        ));

        ledger.db().promotions().set_active("promo1", false).await.unwrap();
        let mut req = request(vec![line("tuna", 1)], Tender::Cash);
        req.promotion_code = Some("EID10".to_string());
        assert!(matches!(
            ledger.commit_sale(req).await.unwrap_err(),
            LedgerError::Core(CoreError::InvalidPromotion(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let ledger = ledger(true).await;
        assert!(matches!(
            ledger.commit_sale(request(vec![], Tender::Cash)).await.unwrap_err(),
            LedgerError::EmptyCart
        ));
    }
}
