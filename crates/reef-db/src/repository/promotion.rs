//! # Promotion Repository
//!
//! Database operations for promotions. Codes are unique case-insensitively;
//! the schema enforces it with `COLLATE NOCASE` and the repository exposes
//! the check so callers can reject duplicates with a typed error first.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::types::Promotion;

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Inserts a promotion.
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, code = %promotion.code, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (id, code, kind, value, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.code)
        .bind(promotion.kind)
        .bind(promotion.value)
        .bind(promotion.is_active)
        .bind(promotion.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a promotion's code, kind, value, and active flag.
    pub async fn update(&self, promotion: &Promotion) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                code = ?2,
                kind = ?3,
                value = ?4,
                is_active = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.code)
        .bind(promotion.kind)
        .bind(promotion.value)
        .bind(promotion.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", &promotion.id));
        }

        Ok(())
    }

    /// Finds a promotion by code, case-insensitively (active or not; the
    /// pricing engine decides whether it may apply).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, code, kind, value, is_active, created_at
            FROM promotions
            WHERE code = ?1 COLLATE NOCASE
            "#,
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    /// Gets a promotion by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            SELECT id, code, kind, value, is_active, created_at
            FROM promotions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    /// True when another promotion (excluding `exclude_id`) already uses
    /// `code`, compared case-insensitively.
    pub async fn code_exists(&self, code: &str, exclude_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = match exclude_id {
            Some(id) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM promotions
                    WHERE code = ?1 COLLATE NOCASE AND id != ?2
                    "#,
                )
                .bind(code.trim())
                .bind(id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM promotions WHERE code = ?1 COLLATE NOCASE",
                )
                .bind(code.trim())
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count > 0)
    }

    /// Activates or deactivates a promotion.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE promotions SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    /// Lists all promotions.
    pub async fn list(&self) -> DbResult<Vec<Promotion>> {
        let promotions = sqlx::query_as::<_, Promotion>(
            "SELECT id, code, kind, value, is_active, created_at FROM promotions ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
