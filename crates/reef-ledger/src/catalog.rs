//! # Catalog Administration
//!
//! Product, promotion, and gift card management with validation layered in
//! front of the repositories. Stock is *not* edited here: once a product is
//! in use its stock moves only through the inventory audit path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use reef_core::types::{BundleComponent, GiftCard, Product, Promotion, PromotionKind};
use reef_core::validation::{
    validate_amount_laari, validate_code, validate_name, validate_percentage_bps,
    validate_quantity,
};
use reef_core::{CoreError, ValidationError};

use crate::error::LedgerResult;
use crate::notify::NotificationTopic;
use crate::Ledger;

/// Generates a fresh gift card code.
pub(crate) fn new_gift_card_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("GC-{}", raw[..12].to_uppercase())
}

// =============================================================================
// Request Types
// =============================================================================

/// One component of a new bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBundleComponent {
    pub component_id: String,
    pub quantity: i64,
}

/// A product to add to the catalog. A non-empty component list makes it a
/// bundle (whose own stock is then ignored).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_laari: i64,
    pub wholesale_price_laari: i64,
    pub initial_stock: i64,
    pub bundle_components: Vec<NewBundleComponent>,
}

/// A promotion to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPromotion {
    pub code: String,
    pub kind: PromotionKind,
    /// Basis points for percentage promotions, laari for fixed ones.
    pub value: i64,
    pub is_active: bool,
}

// =============================================================================
// Administration
// =============================================================================

impl Ledger {
    /// Adds a product (or bundle) to the catalog.
    pub async fn create_product(&self, new: NewProduct) -> LedgerResult<Product> {
        validate_name(&new.name)?;
        validate_amount_laari(new.price_laari)?;
        validate_amount_laari(new.wholesale_price_laari)?;
        if new.initial_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "initial_stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        let is_bundle = !new.bundle_components.is_empty();
        if is_bundle {
            let catalog = self.db().products().load_catalog().await?;
            for component in &new.bundle_components {
                validate_quantity(component.quantity)?;
                let product = catalog.require(&component.component_id)?;
                if product.is_bundle {
                    return Err(ValidationError::InvalidFormat {
                        field: "bundle_components".to_string(),
                        reason: "a bundle cannot contain another bundle".to_string(),
                    }
                    .into());
                }
            }
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            price_laari: new.price_laari,
            wholesale_price_laari: new.wholesale_price_laari,
            stock: if is_bundle { 0 } else { new.initial_stock },
            is_bundle,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db().products().insert(&product).await?;
        if is_bundle {
            let components: Vec<BundleComponent> = new
                .bundle_components
                .iter()
                .map(|c| BundleComponent {
                    bundle_id: product.id.clone(),
                    component_id: c.component_id.clone(),
                    quantity: c.quantity,
                })
                .collect();
            self.db().products().set_components(&product.id, &components).await?;
        }

        info!(id = %product.id, name = %product.name, is_bundle, "Product created");
        Ok(product)
    }

    /// Updates a product's catalog fields. Stock is untouched; use
    /// [`Ledger::adjust_stock`] for that.
    pub async fn update_product(&self, product: &Product) -> LedgerResult<()> {
        validate_name(&product.name)?;
        validate_amount_laari(product.price_laari)?;
        validate_amount_laari(product.wholesale_price_laari)?;

        self.db().products().update(product).await?;
        Ok(())
    }

    /// Soft-deletes (or restores) a product.
    pub async fn set_product_active(&self, product_id: &str, active: bool) -> LedgerResult<()> {
        self.db().products().set_active(product_id, active).await?;
        Ok(())
    }

    /// Searches active products by name or category.
    pub async fn search_products(&self, query: &str, limit: u32) -> LedgerResult<Vec<Product>> {
        Ok(self.db().products().search(query, limit).await?)
    }

    /// Creates a promotion. Codes collide case-insensitively.
    pub async fn create_promotion(&self, new: NewPromotion) -> LedgerResult<Promotion> {
        let code = new.code.trim().to_string();
        validate_code(&code)?;
        match new.kind {
            PromotionKind::Percentage => validate_percentage_bps(new.value)?,
            PromotionKind::Fixed => validate_amount_laari(new.value)?,
        }

        if self.db().promotions().code_exists(&code, None).await? {
            return Err(CoreError::DuplicatePromotionCode(code).into());
        }

        let promotion = Promotion {
            id: Uuid::new_v4().to_string(),
            code,
            kind: new.kind,
            value: new.value,
            is_active: new.is_active,
            created_at: Utc::now(),
        };
        self.db().promotions().insert(&promotion).await?;

        info!(id = %promotion.id, code = %promotion.code, "Promotion created");
        Ok(promotion)
    }

    /// Edits a promotion. The duplicate-code check excludes the promotion
    /// itself so it can keep its own code.
    pub async fn update_promotion(&self, promotion: &Promotion) -> LedgerResult<()> {
        validate_code(&promotion.code)?;
        match promotion.kind {
            PromotionKind::Percentage => validate_percentage_bps(promotion.value)?,
            PromotionKind::Fixed => validate_amount_laari(promotion.value)?,
        }

        if self
            .db()
            .promotions()
            .code_exists(&promotion.code, Some(&promotion.id))
            .await?
        {
            return Err(
                CoreError::DuplicatePromotionCode(promotion.code.trim().to_string()).into(),
            );
        }

        self.db().promotions().update(promotion).await?;
        Ok(())
    }

    /// Activates or deactivates a promotion.
    pub async fn set_promotion_active(&self, promotion_id: &str, active: bool) -> LedgerResult<()> {
        self.db().promotions().set_active(promotion_id, active).await?;
        Ok(())
    }

    /// Issues a gift card with a generated code.
    pub async fn issue_gift_card(
        &self,
        balance_laari: i64,
        customer_id: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> LedgerResult<GiftCard> {
        if balance_laari <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "balance".to_string(),
            }
            .into());
        }

        let card = GiftCard {
            id: new_gift_card_code(),
            initial_balance_laari: balance_laari,
            current_balance_laari: balance_laari,
            is_enabled: true,
            customer_id: customer_id.map(str::to_string),
            expires_at,
            created_at: Utc::now(),
        };
        self.db().gift_cards().issue(&card).await?;

        info!(id = %card.id, balance = %card.balance(), "Gift card issued");
        self.notifier.emit(
            NotificationTopic::Sale,
            format!("Gift card {} issued: {}", card.id, card.balance()),
        );
        Ok(card)
    }

    /// Enables or disables a gift card.
    pub async fn set_gift_card_enabled(&self, card_id: &str, enabled: bool) -> LedgerResult<()> {
        self.db().gift_cards().set_enabled(card_id, enabled).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
