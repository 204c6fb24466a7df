//! # Stock Reconciliation Rules
//!
//! Pure stock math: derived bundle stock and delta planning for sales,
//! returns, and purchase orders.
//!
//! ## Bundle Stock Is Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Breakfast Bundle = 2 × Roshi Pack + 1 × Tuna Can                       │
//! │                                                                         │
//! │  Roshi Pack stock:  7   → floor(7 / 2) = 3                              │
//! │  Tuna Can stock:    5   → floor(5 / 1) = 5                              │
//! │                                                                         │
//! │  effective_stock(bundle) = min(3, 5) = 3                                │
//! │                                                                         │
//! │  The bundle's own stock column is IGNORED and never written.            │
//! │  Recomputed on every read so it can never go stale.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Plan First, Apply Later
//! A sale never mutates stock line by line. The whole cart is decomposed
//! into per-product deltas, the aggregate is validated against current
//! stock, and only then does the caller apply the deltas. Either every
//! delta is applied or none is.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{BundleComponent, CartLine, Product, ReturnRequestLine};

// =============================================================================
// Catalog Lookup Table
// =============================================================================

/// An explicit id → product lookup table plus bundle composition.
///
/// Derived data (bundle stock) is always resolved through this table and
/// never stored denormalized on the bundle row, so reads cannot go stale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<String, Product>,
    components: HashMap<String, Vec<BundleComponent>>,
}

impl Catalog {
    /// Builds a catalog from products and bundle component rows.
    pub fn new(products: Vec<Product>, components: Vec<BundleComponent>) -> Self {
        let mut by_id = HashMap::with_capacity(products.len());
        for product in products {
            by_id.insert(product.id.clone(), product);
        }

        let mut by_bundle: HashMap<String, Vec<BundleComponent>> = HashMap::new();
        for component in components {
            by_bundle
                .entry(component.bundle_id.clone())
                .or_default()
                .push(component);
        }

        Catalog {
            products: by_id,
            components: by_bundle,
        }
    }

    /// Looks up a product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Looks up a product by id, erroring when absent.
    pub fn require(&self, id: &str) -> CoreResult<&Product> {
        self.product(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Returns the component rows of a bundle (empty for non-bundles).
    pub fn components_of(&self, bundle_id: &str) -> &[BundleComponent] {
        self.components
            .get(bundle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over all products in the catalog.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

// =============================================================================
// Effective Stock
// =============================================================================

/// Computes the sellable stock of a product.
///
/// Non-bundles report their stored stock. Bundles derive theirs: for each
/// component, `floor(component_stock / per_bundle_quantity)`, taking the
/// minimum across components. A bundle with no components, or with any
/// component missing from the catalog, has effective stock 0.
pub fn effective_stock(product: &Product, catalog: &Catalog) -> i64 {
    if !product.is_bundle {
        return product.stock;
    }

    let components = catalog.components_of(&product.id);
    if components.is_empty() {
        return 0;
    }

    components
        .iter()
        .map(|component| {
            if component.quantity <= 0 {
                return 0;
            }
            match catalog.product(&component.component_id) {
                Some(p) => (p.stock.max(0)) / component.quantity,
                None => 0,
            }
        })
        .min()
        .unwrap_or(0)
}

// =============================================================================
// Delta Planning
// =============================================================================

/// A planned stock movement for a single product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    /// Signed change (negative for deductions).
    pub delta: i64,
}

/// Decomposes a cart into per-product stock deductions.
///
/// Bundle lines become component deltas; non-bundle lines deduct
/// themselves. Deltas for the same product are aggregated (several cart
/// lines may touch one component) and the aggregate is validated so the
/// commit can be rejected before anything is written.
pub fn plan_sale_deltas(cart: &[CartLine], catalog: &Catalog) -> CoreResult<Vec<StockDelta>> {
    let mut deltas = plan_deltas(
        cart.iter().map(|line| (line.product_id.as_str(), line.quantity)),
        catalog,
        -1,
    )?;

    // Validate the aggregate against current stock. Only non-bundle rows
    // carry stored stock; bundles never appear in the decomposed plan.
    for delta in &deltas {
        let product = catalog.require(&delta.product_id)?;
        if product.stock + delta.delta < 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: -delta.delta,
            });
        }
    }

    deltas.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    Ok(deltas)
}

/// Decomposes returned lines into per-product stock restorations.
///
/// Mirrors the sale decomposition with positive deltas: returning a bundle
/// restores its components proportionally.
pub fn plan_return_deltas(
    lines: &[ReturnRequestLine],
    catalog: &Catalog,
) -> CoreResult<Vec<StockDelta>> {
    let mut deltas = plan_deltas(
        lines
            .iter()
            .map(|line| (line.product_id.as_str(), line.quantity)),
        catalog,
        1,
    )?;
    deltas.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    Ok(deltas)
}

/// Shared decomposition: expands bundles into components and aggregates
/// signed deltas per product.
fn plan_deltas<'a>(
    lines: impl Iterator<Item = (&'a str, i64)>,
    catalog: &Catalog,
    sign: i64,
) -> CoreResult<Vec<StockDelta>> {
    let mut aggregated: HashMap<String, i64> = HashMap::new();

    for (product_id, quantity) in lines {
        let product = catalog.require(product_id)?;

        if product.is_bundle {
            let components = catalog.components_of(&product.id);
            if components.is_empty() {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: 0,
                    requested: quantity,
                });
            }
            for component in components {
                catalog.require(&component.component_id)?;
                *aggregated.entry(component.component_id.clone()).or_insert(0) +=
                    sign * component.quantity * quantity;
            }
        } else {
            *aggregated.entry(product.id.clone()).or_insert(0) += sign * quantity;
        }
    }

    Ok(aggregated
        .into_iter()
        .map(|(product_id, delta)| StockDelta { product_id, delta })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, stock: i64, is_bundle: bool) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: "GEN".to_string(),
            price_laari: 1000,
            wholesale_price_laari: 600,
            stock,
            is_bundle,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn component(bundle: &str, component: &str, qty: i64) -> BundleComponent {
        BundleComponent {
            bundle_id: bundle.to_string(),
            component_id: component.to_string(),
            quantity: qty,
        }
    }

    fn cart_line(id: &str, qty: i64) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            unit_price_laari: 1000,
            wholesale_price_laari: 600,
            quantity: qty,
        }
    }

    fn breakfast_catalog() -> Catalog {
        Catalog::new(
            vec![
                product("roshi", 7, false),
                product("tuna", 5, false),
                product("bundle", 999, true), // own stock is ignored
            ],
            vec![
                component("bundle", "roshi", 2),
                component("bundle", "tuna", 1),
            ],
        )
    }

    #[test]
    fn test_effective_stock_plain_product() {
        let catalog = breakfast_catalog();
        let roshi = catalog.product("roshi").unwrap();
        assert_eq!(effective_stock(roshi, &catalog), 7);
    }

    #[test]
    fn test_effective_stock_bundle_is_component_minimum() {
        let catalog = breakfast_catalog();
        let bundle = catalog.product("bundle").unwrap();
        // min(floor(7/2), floor(5/1)) = min(3, 5) = 3; stored 999 ignored
        assert_eq!(effective_stock(bundle, &catalog), 3);
    }

    #[test]
    fn test_effective_stock_missing_component_is_zero() {
        let catalog = Catalog::new(
            vec![product("bundle", 10, true)],
            vec![component("bundle", "ghost", 1)],
        );
        let bundle = catalog.product("bundle").unwrap();
        assert_eq!(effective_stock(bundle, &catalog), 0);
    }

    #[test]
    fn test_effective_stock_empty_bundle_is_zero() {
        let catalog = Catalog::new(vec![product("bundle", 10, true)], vec![]);
        let bundle = catalog.product("bundle").unwrap();
        assert_eq!(effective_stock(bundle, &catalog), 0);
    }

    #[test]
    fn test_plan_sale_deltas_decomposes_bundles() {
        let catalog = breakfast_catalog();
        let deltas =
            plan_sale_deltas(&[cart_line("bundle", 2), cart_line("tuna", 1)], &catalog).unwrap();

        // 2 bundles → 4 roshi + 2 tuna, plus 1 direct tuna = 3 tuna
        assert_eq!(
            deltas,
            vec![
                StockDelta {
                    product_id: "roshi".to_string(),
                    delta: -4
                },
                StockDelta {
                    product_id: "tuna".to_string(),
                    delta: -3
                },
            ]
        );
    }

    #[test]
    fn test_plan_sale_deltas_rejects_aggregate_overdraw() {
        let catalog = breakfast_catalog();
        // 3 bundles need 6 roshi (ok, 7 in stock) but also 3 tuna; adding 3
        // direct tuna pushes the aggregate to 6 > 5 in stock.
        let err = plan_sale_deltas(&[cart_line("bundle", 3), cart_line("tuna", 3)], &catalog)
            .unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_sale_deltas_unknown_product() {
        let catalog = breakfast_catalog();
        let err = plan_sale_deltas(&[cart_line("ghost", 1)], &catalog).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_plan_return_deltas_restores_components() {
        let catalog = breakfast_catalog();
        let deltas = plan_return_deltas(
            &[ReturnRequestLine {
                product_id: "bundle".to_string(),
                quantity: 1,
                reason: "damaged".to_string(),
            }],
            &catalog,
        )
        .unwrap();

        assert_eq!(
            deltas,
            vec![
                StockDelta {
                    product_id: "roshi".to_string(),
                    delta: 2
                },
                StockDelta {
                    product_id: "tuna".to_string(),
                    delta: 1
                },
            ]
        );
    }
}
