//! # Inventory Repository
//!
//! The single path through which stock changes, pairing every stock
//! mutation with exactly one append-only audit event.
//!
//! ## The Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_delta(product, +/-n)                                             │
//! │       │                                                                 │
//! │       ├── UPDATE products SET stock = stock + n                         │
//! │       │   WHERE id = ? AND is_bundle = 0 AND stock + n >= 0             │
//! │       │        (0 rows → rejected, nothing written)                     │
//! │       │                                                                 │
//! │       └── INSERT INTO inventory_events (quantity_change = n, ...)       │
//! │                                                                         │
//! │  Both statements share one transaction. SUM(quantity_change) per        │
//! │  product therefore reconstructs its full stock history.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bundles are rejected here: their stock is derived, never stored, and
//! sale/return paths decompose them into component deltas before calling in.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use reef_core::types::{InventoryEvent, InventoryEventType};

/// Repository for stock mutations and the inventory audit trail.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Applies a stock delta and records the audit event atomically.
    ///
    /// Fails with a conflict (and writes nothing) when the product is
    /// missing, is a bundle, or the delta would drive stock negative.
    pub async fn apply_delta(
        &self,
        product_id: &str,
        delta: i64,
        event_type: InventoryEventType,
        related_id: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<InventoryEvent> {
        let mut tx = self.pool.begin().await?;
        let event =
            Self::apply_delta_in(&mut tx, product_id, delta, event_type, related_id, notes).await?;
        tx.commit().await?;
        Ok(event)
    }

    /// Connection-scoped variant for composition into a larger commit.
    pub async fn apply_delta_in(
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
        event_type: InventoryEventType,
        related_id: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<InventoryEvent> {
        debug!(product_id = %product_id, delta = %delta, ?event_type, "Applying stock delta");

        let now = Utc::now();

        // Guarded update: the WHERE clause carries the whole invariant so
        // the reject path writes nothing.
        let result = sqlx::query(
            r#"
            UPDATE products SET
                stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_bundle = 0 AND stock + ?2 >= 0
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::classify_rejection(conn, product_id, delta).await);
        }

        let event = InventoryEvent {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            event_type,
            quantity_change: delta,
            created_at: now,
            related_id: related_id.map(str::to_string),
            notes: notes.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_events (
                id, product_id, event_type, quantity_change,
                created_at, related_id, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&event.id)
        .bind(&event.product_id)
        .bind(event.event_type)
        .bind(event.quantity_change)
        .bind(event.created_at)
        .bind(&event.related_id)
        .bind(&event.notes)
        .execute(&mut *conn)
        .await?;

        Ok(event)
    }

    /// Works out why the guarded update matched nothing.
    async fn classify_rejection(
        conn: &mut SqliteConnection,
        product_id: &str,
        delta: i64,
    ) -> DbError {
        let row: Result<Option<(bool, i64)>, sqlx::Error> =
            sqlx::query_as("SELECT is_bundle, stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await;

        match row {
            Ok(None) => DbError::not_found("Product", product_id),
            Ok(Some((true, _))) => DbError::conflict(
                "Product",
                product_id,
                "bundle stock is derived and cannot be adjusted directly",
            ),
            Ok(Some((false, stock))) => DbError::conflict(
                "Product",
                product_id,
                format!("insufficient stock: available {stock}, requested {}", -delta),
            ),
            Err(e) => e.into(),
        }
    }

    /// Lists the audit trail for a product, newest first.
    pub async fn events_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<InventoryEvent>> {
        let events = sqlx::query_as::<_, InventoryEvent>(
            r#"
            SELECT id, product_id, event_type, quantity_change,
                   created_at, related_id, notes
            FROM inventory_events
            WHERE product_id = ?1
            ORDER BY created_at DESC, id
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Units sold per product since `cutoff` (sale events only), for the
    /// forecasting window.
    pub async fn units_sold_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DbResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT product_id, SUM(-quantity_change) AS units
            FROM inventory_events
            WHERE event_type = 'sale' AND created_at >= ?1
            GROUP BY product_id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
