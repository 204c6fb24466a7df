//! # Product Repository
//!
//! Database operations for the catalog: products and bundle composition.
//!
//! ## Stock Is Not Written Here
//! Product rows are created and edited here, but once a product is in use
//! its `stock` column changes only through the inventory repository's
//! `apply_delta`, which is what keeps the audit trail complete.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::stock::Catalog;
use reef_core::types::{BundleComponent, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_laari, wholesale_price_laari,
                stock, is_bundle, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_laari)
        .bind(product.wholesale_price_laari)
        .bind(product.stock)
        .bind(product.is_bundle)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's catalog fields (not its stock).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                price_laari = ?4,
                wholesale_price_laari = ?5,
                is_bundle = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_laari)
        .bind(product.wholesale_price_laari)
        .bind(product.is_bundle)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_laari, wholesale_price_laari,
                   stock, is_bundle, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID, erroring when absent.
    pub async fn require(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists active products.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_laari, wholesale_price_laari,
                   stock, is_bundle, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products by name or category (case-insensitive
    /// substring).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_laari, wholesale_price_laari,
                   stock, is_bundle, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 COLLATE NOCASE OR category LIKE ?1 COLLATE NOCASE)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Soft-deletes (or restores) a product.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Replaces a bundle's component list.
    pub async fn set_components(
        &self,
        bundle_id: &str,
        components: &[BundleComponent],
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bundle_components WHERE bundle_id = ?1")
            .bind(bundle_id)
            .execute(&mut *tx)
            .await?;

        for component in components {
            sqlx::query(
                r#"
                INSERT INTO bundle_components (bundle_id, component_id, quantity)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(bundle_id)
            .bind(&component.component_id)
            .bind(component.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets the component rows of a bundle.
    pub async fn components_of(&self, bundle_id: &str) -> DbResult<Vec<BundleComponent>> {
        let components = sqlx::query_as::<_, BundleComponent>(
            r#"
            SELECT bundle_id, component_id, quantity
            FROM bundle_components
            WHERE bundle_id = ?1
            ORDER BY component_id
            "#,
        )
        .bind(bundle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(components)
    }

    /// Loads the full catalog lookup table (all products plus bundle
    /// composition) for the pure stock/pricing engines.
    ///
    /// Always loaded fresh per operation so derived bundle stock can never
    /// go stale.
    pub async fn load_catalog(&self) -> DbResult<Catalog> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_laari, wholesale_price_laari,
                   stock, is_bundle, is_active, created_at, updated_at
            FROM products
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let components = sqlx::query_as::<_, BundleComponent>(
            "SELECT bundle_id, component_id, quantity FROM bundle_components",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Catalog::new(products, components))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use reef_core::stock::effective_stock;
    use reef_core::types::{BundleComponent, Product};

    fn product(id: &str, name: &str, stock: i64, is_bundle: bool) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "GROCERY".to_string(),
            price_laari: 1500,
            wholesale_price_laari: 900,
            stock,
            is_bundle,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p1", "Tuna Can 185g", 12, false))
            .await
            .unwrap();

        let loaded = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Tuna Can 185g");
        assert_eq!(loaded.stock, 12);
        assert!(!loaded.is_bundle);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_matches_name_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p1", "Tuna Can 185g", 12, false))
            .await
            .unwrap();
        repo.insert(&product("p2", "Roshi Pack", 30, false))
            .await
            .unwrap();

        let hits = repo.search("tuna", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p1");

        let all = repo.search("", 20).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_snapshot_derives_bundle_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("roshi", "Roshi Pack", 7, false))
            .await
            .unwrap();
        repo.insert(&product("tuna", "Tuna Can 185g", 5, false))
            .await
            .unwrap();
        repo.insert(&product("bundle", "Breakfast Bundle", 0, true))
            .await
            .unwrap();
        repo.set_components(
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

        let catalog = repo.load_catalog().await.unwrap();
        let bundle = catalog.product("bundle").unwrap();
        assert_eq!(effective_stock(bundle, &catalog), 3);
    }

    #[tokio::test]
    async fn test_update_missing_product_errors() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let missing = product("ghost", "Ghost", 0, false);
        assert!(repo.update(&missing).await.is_err());
    }
}
