//! # Gift Card Repository
//!
//! Database operations for gift cards.
//!
//! ## Balance Guard
//! Deductions use a guarded UPDATE (`WHERE current_balance >= amount`), so
//! a card can never go negative even if a stale balance was read earlier.
//! Balances only ever decrease after issuance.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::types::GiftCard;

/// Repository for gift card database operations.
#[derive(Debug, Clone)]
pub struct GiftCardRepository {
    pool: SqlitePool,
}

impl GiftCardRepository {
    /// Creates a new GiftCardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GiftCardRepository { pool }
    }

    /// Issues (inserts) a gift card.
    pub async fn issue(&self, card: &GiftCard) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::issue_in(&mut conn, card).await
    }

    /// Connection-scoped issuance, used when a return issues store credit
    /// inside the return's transaction.
    pub async fn issue_in(conn: &mut SqliteConnection, card: &GiftCard) -> DbResult<()> {
        debug!(id = %card.id, balance = %card.initial_balance_laari, "Issuing gift card");

        sqlx::query(
            r#"
            INSERT INTO gift_cards (
                id, initial_balance_laari, current_balance_laari,
                is_enabled, customer_id, expires_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&card.id)
        .bind(card.initial_balance_laari)
        .bind(card.current_balance_laari)
        .bind(card.is_enabled)
        .bind(&card.customer_id)
        .bind(&card.expires_at)
        .bind(card.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a gift card by its code.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<GiftCard>> {
        let card = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT id, initial_balance_laari, current_balance_laari,
                   is_enabled, customer_id, expires_at, created_at
            FROM gift_cards
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Gets a gift card by its code, erroring when absent.
    pub async fn require(&self, id: &str) -> DbResult<GiftCard> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Gift card", id))
    }

    /// Enables or disables a card.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE gift_cards SET is_enabled = ?2 WHERE id = ?1")
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Gift card", id));
        }

        Ok(())
    }

    /// Connection-scoped guarded deduction. Rejects (writing nothing) when
    /// the balance cannot cover `amount_laari`.
    pub async fn deduct_in(
        conn: &mut SqliteConnection,
        id: &str,
        amount_laari: i64,
    ) -> DbResult<()> {
        debug!(id = %id, amount = %amount_laari, "Deducting gift card balance");

        if amount_laari <= 0 {
            return Err(DbError::conflict(
                "Gift card",
                id,
                "deduction must be positive",
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE gift_cards SET
                current_balance_laari = current_balance_laari - ?2
            WHERE id = ?1 AND current_balance_laari >= ?2
            "#,
        )
        .bind(id)
        .bind(amount_laari)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Gift card",
                id,
                "balance cannot cover deduction",
            ));
        }

        Ok(())
    }

    /// Lists cards owned by a customer.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<GiftCard>> {
        let cards = sqlx::query_as::<_, GiftCard>(
            r#"
            SELECT id, initial_balance_laari, current_balance_laari,
                   is_enabled, customer_id, expires_at, created_at
            FROM gift_cards
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use reef_core::types::GiftCard;

    fn card(id: &str, balance: i64) -> GiftCard {
        GiftCard {
            id: id.to_string(),
            initial_balance_laari: balance,
            current_balance_laari: balance,
            is_enabled: true,
            customer_id: None,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_issue_and_deduct() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.gift_cards();

        repo.issue(&card("GC-1", 3000)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        super::GiftCardRepository::deduct_in(&mut conn, "GC-1", 1200)
            .await
            .unwrap();
        drop(conn);

        let loaded = repo.require("GC-1").await.unwrap();
        assert_eq!(loaded.current_balance_laari, 1800);
        assert_eq!(loaded.initial_balance_laari, 3000);
    }

    #[tokio::test]
    async fn test_deduction_never_overdraws() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.gift_cards();

        repo.issue(&card("GC-1", 1000)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let err = super::GiftCardRepository::deduct_in(&mut conn, "GC-1", 1001)
            .await
            .unwrap_err();
        drop(conn);
        assert!(err.to_string().contains("balance"));

        // Balance untouched after the rejected deduction.
        assert_eq!(
            repo.require("GC-1").await.unwrap().current_balance_laari,
            1000
        );
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.gift_cards();

        repo.issue(&card("GC-1", 1000)).await.unwrap();
        repo.set_enabled("GC-1", false).await.unwrap();
        assert!(!repo.require("GC-1").await.unwrap().is_enabled);
    }
}
