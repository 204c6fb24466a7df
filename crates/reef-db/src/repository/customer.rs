//! # Customer Repository
//!
//! Database operations for customers and loyalty tiers.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::types::{Customer, LoyaltyTier};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, max_credit_limit_laari,
                credit_blocked, loyalty_points, loyalty_tier_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.max_credit_limit_laari)
        .bind(customer.credit_blocked)
        .bind(customer.loyalty_points)
        .bind(&customer.loyalty_tier_id)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, max_credit_limit_laari,
                   credit_blocked, loyalty_points, loyalty_tier_id, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID, erroring when absent.
    pub async fn require(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Updates a customer's profile and credit fields.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                max_credit_limit_laari = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.max_credit_limit_laari)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Sets or clears the credit block flag.
    pub async fn set_credit_blocked(&self, id: &str, blocked: bool) -> DbResult<()> {
        debug!(id = %id, blocked = %blocked, "Setting credit block");

        let result = sqlx::query("UPDATE customers SET credit_blocked = ?2 WHERE id = ?1")
            .bind(id)
            .bind(blocked)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Connection-scoped loyalty write, part of the atomic commit: stores
    /// the new point balance and (optionally) a tier promotion.
    pub async fn apply_loyalty_in(
        conn: &mut SqliteConnection,
        id: &str,
        new_points: i64,
        promoted_to: Option<&str>,
    ) -> DbResult<()> {
        let result = match promoted_to {
            Some(tier_id) => {
                sqlx::query(
                    "UPDATE customers SET loyalty_points = ?2, loyalty_tier_id = ?3 WHERE id = ?1",
                )
                .bind(id)
                .bind(new_points)
                .bind(tier_id)
                .execute(&mut *conn)
                .await?
            }
            None => {
                sqlx::query("UPDATE customers SET loyalty_points = ?2 WHERE id = ?1")
                    .bind(id)
                    .bind(new_points)
                    .execute(&mut *conn)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Lists customers.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, max_credit_limit_laari,
                   credit_blocked, loyalty_points, loyalty_tier_id, created_at
            FROM customers
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    // -------------------------------------------------------------------------
    // Loyalty tiers
    // -------------------------------------------------------------------------

    /// Inserts a loyalty tier.
    pub async fn insert_tier(&self, tier: &LoyaltyTier) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_tiers (id, name, min_points, point_multiplier_bps)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&tier.id)
        .bind(&tier.name)
        .bind(tier.min_points)
        .bind(tier.point_multiplier_bps)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists all loyalty tiers, ascending by threshold.
    pub async fn list_tiers(&self) -> DbResult<Vec<LoyaltyTier>> {
        let tiers = sqlx::query_as::<_, LoyaltyTier>(
            r#"
            SELECT id, name, min_points, point_multiplier_bps
            FROM loyalty_tiers
            ORDER BY min_points
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use reef_core::types::{Customer, LoyaltyTier};

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: "Aminath".to_string(),
            phone: Some("7771234".to_string()),
            max_credit_limit_laari: Some(100_000),
            credit_blocked: false,
            loyalty_points: 0,
            loyalty_tier_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&customer("c1")).await.unwrap();

        let loaded = repo.require("c1").await.unwrap();
        assert_eq!(loaded.name, "Aminath");
        assert_eq!(loaded.max_credit_limit_laari, Some(100_000));
        assert!(!loaded.credit_blocked);
    }

    #[tokio::test]
    async fn test_credit_block_flag() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&customer("c1")).await.unwrap();
        repo.set_credit_blocked("c1", true).await.unwrap();
        assert!(repo.require("c1").await.unwrap().credit_blocked);

        repo.set_credit_blocked("c1", false).await.unwrap();
        assert!(!repo.require("c1").await.unwrap().credit_blocked);

        assert!(repo.set_credit_blocked("ghost", true).await.is_err());
    }

    #[tokio::test]
    async fn test_tiers_listed_ascending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert_tier(&LoyaltyTier {
            id: "silver".to_string(),
            name: "Silver".to_string(),
            min_points: 500,
            point_multiplier_bps: 12500,
        })
        .await
        .unwrap();
        repo.insert_tier(&LoyaltyTier {
            id: "bronze".to_string(),
            name: "Bronze".to_string(),
            min_points: 0,
            point_multiplier_bps: 10000,
        })
        .await
        .unwrap();

        let tiers = repo.list_tiers().await.unwrap();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].id, "bronze");
        assert_eq!(tiers[1].id, "silver");
    }
}
