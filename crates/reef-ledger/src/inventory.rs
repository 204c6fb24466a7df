//! # Inventory Operations
//!
//! Manual stock adjustments, purchase orders, derived stock reads, and the
//! low-stock forecast. Every stock change goes through the inventory
//! repository's `apply_delta`, so the audit trail stays the complete
//! history of every movement.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use reef_core::stock;
use reef_core::types::{
    InventoryEvent, InventoryEventType, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
    Wholesaler,
};
use reef_core::validation::{validate_name, validate_quantity};
use reef_db::{DbError, InventoryRepository, PurchaseOrderRepository};

use crate::error::LedgerResult;
use crate::notify::NotificationTopic;
use crate::Ledger;

// =============================================================================
// Request & Result Types
// =============================================================================

/// One line of a new purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchaseOrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub purchase_price_laari: i64,
}

/// A product flagged by the forecast: selling fast enough that its stock
/// covers fewer days than the configured threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: String,
    pub name: String,
    pub stock: i64,
    /// Units sold over the lookback window.
    pub units_sold: i64,
    /// Days the current stock lasts at the window's average daily rate.
    pub cover_days: i64,
}

// =============================================================================
// Inventory Operations
// =============================================================================

impl Ledger {
    /// Sellable stock of a product, derived fresh: stored stock for plain
    /// products, the component minimum for bundles.
    pub async fn effective_stock(&self, product_id: &str) -> LedgerResult<i64> {
        let catalog = self.db().products().load_catalog().await?;
        let product = catalog.require(product_id)?;
        Ok(stock::effective_stock(product, &catalog))
    }

    /// Applies a manual stock adjustment with its audit event. Rejected for
    /// bundles and for deltas that would drive stock negative.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        reason: &str,
    ) -> LedgerResult<InventoryEvent> {
        debug!(product_id = %product_id, delta = %delta, "Manual stock adjustment");

        let event = self
            .db()
            .inventory()
            .apply_delta(
                product_id,
                delta,
                InventoryEventType::Adjustment,
                None,
                Some(reason),
            )
            .await?;

        self.notifier.emit(
            NotificationTopic::Stock,
            format!("Stock adjusted by {delta}: {reason}"),
        );
        Ok(event)
    }

    /// The audit trail for a product, newest first.
    pub async fn stock_history(
        &self,
        product_id: &str,
        limit: u32,
    ) -> LedgerResult<Vec<InventoryEvent>> {
        Ok(self.db().inventory().events_for_product(product_id, limit).await?)
    }

    /// Registers a wholesaler.
    pub async fn create_wholesaler(
        &self,
        name: &str,
        contact: Option<&str>,
    ) -> LedgerResult<Wholesaler> {
        validate_name(name)?;

        let wholesaler = Wholesaler {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            contact: contact.map(str::to_string),
            created_at: Utc::now(),
        };
        self.db().purchase_orders().insert_wholesaler(&wholesaler).await?;
        Ok(wholesaler)
    }

    /// Raises a pending purchase order against a wholesaler.
    pub async fn create_purchase_order(
        &self,
        wholesaler_id: &str,
        lines: Vec<NewPurchaseOrderLine>,
    ) -> LedgerResult<PurchaseOrder> {
        let catalog = self.db().products().load_catalog().await?;
        for line in &lines {
            validate_quantity(line.quantity)?;
            catalog.require(&line.product_id)?;
        }

        let order = PurchaseOrder {
            id: Uuid::new_v4().to_string(),
            wholesaler_id: wholesaler_id.to_string(),
            status: PurchaseOrderStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
        };
        let order_lines: Vec<PurchaseOrderLine> = lines
            .iter()
            .map(|line| PurchaseOrderLine {
                id: Uuid::new_v4().to_string(),
                purchase_order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                purchase_price_laari: line.purchase_price_laari,
            })
            .collect();

        self.db().purchase_orders().create(&order, &order_lines).await?;

        info!(id = %order.id, lines = order_lines.len(), "Purchase order created");
        Ok(order)
    }

    /// Processes a pending purchase order: receives every line's stock
    /// through the audit path and freezes the order, in one transaction.
    /// The `pending → processed` transition is one-way, so an order can
    /// never be received twice.
    pub async fn process_purchase_order(&self, order_id: &str) -> LedgerResult<()> {
        let order = self.db().purchase_orders().require(order_id).await?;
        let lines = self.db().purchase_orders().lines_of(&order.id).await?;
        let now = Utc::now();

        let mut tx = self.db().pool().begin().await.map_err(DbError::from)?;

        PurchaseOrderRepository::mark_processed_in(&mut tx, &order.id, now).await?;
        for line in &lines {
            InventoryRepository::apply_delta_in(
                &mut tx,
                &line.product_id,
                line.quantity,
                InventoryEventType::Purchase,
                Some(&order.id),
                None,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %order.id, lines = lines.len(), "Purchase order processed");
        self.notifier.emit(
            NotificationTopic::Stock,
            format!("Purchase order received ({} line(s))", lines.len()),
        );
        Ok(())
    }

    /// Flags products whose stock covers fewer days than the configured
    /// threshold, at the average daily sale rate over the lookback window.
    pub async fn low_stock_alerts(&self) -> LedgerResult<Vec<LowStockAlert>> {
        let forecast = &self.settings().forecast;
        let cutoff = Utc::now() - Duration::days(forecast.lookback_days);

        let sold = self.db().inventory().units_sold_since(cutoff).await?;
        let catalog = self.db().products().load_catalog().await?;

        let mut alerts = Vec::new();
        for (product_id, units_sold) in sold {
            if units_sold <= 0 {
                continue;
            }
            let Some(product) = catalog.product(&product_id) else {
                continue;
            };
            if !product.is_active {
                continue;
            }

            // stock / (units / lookback_days), kept in integer arithmetic
            let cover_days = product.stock * forecast.lookback_days / units_sold;
            if cover_days < forecast.low_stock_cover_days {
                alerts.push(LowStockAlert {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    stock: product.stock,
                    units_sold,
                    cover_days,
                });
            }
        }

        alerts.sort_by_key(|alert| alert.cover_days);
        Ok(alerts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reef_core::settings::PosSettings;
    use reef_core::types::{BundleComponent, Product};
    use reef_db::{Database, DbConfig};
    use reef_sync::ConnectivityHandle;

    use crate::error::LedgerError;

    async fn ledger() -> Ledger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let product = |id: &str, stock: i64, is_bundle: bool| Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: "GROCERY".to_string(),
            price_laari: 1000,
            wholesale_price_laari: 600,
            stock,
            is_bundle,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        db.products().insert(&product("roshi", 7, false)).await.unwrap();
        db.products().insert(&product("tuna", 5, false)).await.unwrap();
        db.products().insert(&product("bundle", 0, true)).await.unwrap();
        db.products()
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

        let (_handle, watch) = ConnectivityHandle::with_initial(true);
        Ledger::new(db, PosSettings::default(), watch)
    }

    #[tokio::test]
    async fn test_effective_stock_reads_derived_value() {
        let ledger = ledger().await;
        assert_eq!(ledger.effective_stock("roshi").await.unwrap(), 7);
        assert_eq!(ledger.effective_stock("bundle").await.unwrap(), 3);

        // The derivation tracks component stock with no caching anywhere.
        ledger.adjust_stock("roshi", -4, "damaged in storage").await.unwrap();
        assert_eq!(ledger.effective_stock("bundle").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_adjust_stock_writes_audit_event() {
        let ledger = ledger().await;

        let event = ledger.adjust_stock("tuna", -2, "stocktake").await.unwrap();
        assert_eq!(event.event_type, InventoryEventType::Adjustment);
        assert_eq!(event.quantity_change, -2);
        assert_eq!(event.notes.as_deref(), Some("stocktake"));

        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 3);

        // Overdraw and bundle adjustments are rejected.
        assert!(ledger.adjust_stock("tuna", -10, "oops").await.is_err());
        assert!(ledger.adjust_stock("bundle", 5, "nope").await.is_err());
    }

    #[tokio::test]
    async fn test_purchase_order_receives_stock_once() {
        let ledger = ledger().await;

        let wholesaler = ledger.create_wholesaler("Male' Traders", None).await.unwrap();
        let order = ledger
            .create_purchase_order(
                &wholesaler.id,
                vec![NewPurchaseOrderLine {
                    product_id: "tuna".to_string(),
                    quantity: 24,
                    purchase_price_laari: 800,
                }],
            )
            .await
            .unwrap();

        ledger.process_purchase_order(&order.id).await.unwrap();

        let tuna = ledger.db().products().require("tuna").await.unwrap();
        assert_eq!(tuna.stock, 29);

        let events = ledger.db().inventory().events_for_product("tuna", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, InventoryEventType::Purchase);
        assert_eq!(events[0].related_id.as_deref(), Some(order.id.as_str()));

        // The transition is one-way: no second receipt, no extra stock.
        assert!(matches!(
            ledger.process_purchase_order(&order.id).await.unwrap_err(),
            LedgerError::Db(DbError::Conflict { .. })
        ));
        assert_eq!(ledger.db().products().require("tuna").await.unwrap().stock, 29);
    }

    #[tokio::test]
    async fn test_purchase_order_unknown_product_rejected() {
        let ledger = ledger().await;
        let wholesaler = ledger.create_wholesaler("Male' Traders", None).await.unwrap();

        assert!(ledger
            .create_purchase_order(
                &wholesaler.id,
                vec![NewPurchaseOrderLine {
                    product_id: "ghost".to_string(),
                    quantity: 1,
                    purchase_price_laari: 100,
                }],
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_low_stock_alerts_flag_fast_sellers() {
        let ledger = ledger().await;

        // 5 tuna sold within the window leaves 0 cover days against the
        // 30-day lookback; roshi has no sales and is never flagged.
        ledger
            .db()
            .inventory()
            .apply_delta("tuna", -5, InventoryEventType::Sale, None, None)
            .await
            .unwrap();

        let alerts = ledger.low_stock_alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].product_id, "tuna");
        assert_eq!(alerts[0].stock, 0);
        assert_eq!(alerts[0].cover_days, 0);
    }

    #[tokio::test]
    async fn test_low_stock_alerts_ignore_well_covered_products() {
        let ledger = ledger().await;

        // One sale out of plenty of stock: 6 remain against 1 unit per
        // 30 days, far above the 7-day threshold.
        ledger
            .db()
            .inventory()
            .apply_delta("roshi", -1, InventoryEventType::Sale, None, None)
            .await
            .unwrap();

        assert!(ledger.low_stock_alerts().await.unwrap().is_empty());
    }
}
