//! # Purchase Order Repository
//!
//! Database operations for wholesalers and purchase orders. The
//! `pending → processed` transition is one-way and guarded; receiving the
//! stock itself goes through the inventory repository so the audit trail
//! stays complete.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use reef_core::types::{PurchaseOrder, PurchaseOrderLine, Wholesaler};

/// Repository for purchase order database operations.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    /// Creates a new PurchaseOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Wholesalers
    // -------------------------------------------------------------------------

    /// Inserts a wholesaler.
    pub async fn insert_wholesaler(&self, wholesaler: &Wholesaler) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO wholesalers (id, name, contact, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&wholesaler.id)
        .bind(&wholesaler.name)
        .bind(&wholesaler.contact)
        .bind(wholesaler.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists wholesalers.
    pub async fn list_wholesalers(&self) -> DbResult<Vec<Wholesaler>> {
        let wholesalers = sqlx::query_as::<_, Wholesaler>(
            "SELECT id, name, contact, created_at FROM wholesalers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(wholesalers)
    }

    // -------------------------------------------------------------------------
    // Purchase orders
    // -------------------------------------------------------------------------

    /// Creates a purchase order with its lines, atomically.
    pub async fn create(
        &self,
        order: &PurchaseOrder,
        lines: &[PurchaseOrderLine],
    ) -> DbResult<()> {
        debug!(id = %order.id, lines = lines.len(), "Creating purchase order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (id, wholesaler_id, status, created_at, processed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.wholesaler_id)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.processed_at)
        .execute(&mut *tx)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_lines (
                    id, purchase_order_id, product_id, quantity, purchase_price_laari
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(&line.purchase_order_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.purchase_price_laari)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a purchase order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, wholesaler_id, status, created_at, processed_at
            FROM purchase_orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets a purchase order by ID, erroring when absent.
    pub async fn require(&self, id: &str) -> DbResult<PurchaseOrder> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase order", id))
    }

    /// Gets the lines of a purchase order.
    pub async fn lines_of(&self, order_id: &str) -> DbResult<Vec<PurchaseOrderLine>> {
        let lines = sqlx::query_as::<_, PurchaseOrderLine>(
            r#"
            SELECT id, purchase_order_id, product_id, quantity, purchase_price_laari
            FROM purchase_order_lines
            WHERE purchase_order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Marks an order processed. One-way: a processed order never matches
    /// the guard again, so double-processing (and double-receiving stock)
    /// is impossible.
    pub async fn mark_processed(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::mark_processed_in(&mut conn, id, at).await
    }

    /// Connection-scoped variant, so receiving the stock and freezing the
    /// order share one transaction.
    pub async fn mark_processed_in(
        conn: &mut SqliteConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_orders SET
                status = 'processed',
                processed_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Purchase order",
                id,
                "not found or already processed",
            ));
        }

        Ok(())
    }

    /// Lists recent purchase orders, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT id, wholesaler_id, status, created_at, processed_at
            FROM purchase_orders
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
