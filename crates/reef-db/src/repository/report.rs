//! # Report Repository
//!
//! Persistence for the reconciliation reporting engine: daily (Z-) report
//! partitions and monthly statements.
//!
//! ## The Partition Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  candidate set = transactions with NO row in daily_report_transactions  │
//! │                                                                         │
//! │  Persisting a report inserts the report AND its junction rows in one    │
//! │  transaction; transaction_id is UNIQUE in the junction table, so a      │
//! │  transaction can never be partitioned into two reports.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use reef_core::reporting::ReportCandidate;
use reef_core::types::{
    DailyReport, GiftCardPayment, MethodTotal, MonthlyStatement, ReturnLine, Transaction,
    TransactionLine,
};

/// Repository for reporting database operations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Daily (Z-) reports
    // -------------------------------------------------------------------------

    /// Loads every transaction not yet partitioned into a daily report,
    /// with the lines, returns, and gift-card payments the aggregation
    /// needs.
    pub async fn unreported_candidates(&self) -> DbResult<Vec<ReportCandidate>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT t.id, t.customer_id, t.subtotal_laari, t.discount_laari,
                   t.promotion_code, t.total_laari, t.payment_status,
                   t.payment_method, t.created_at
            FROM transactions t
            WHERE t.id NOT IN (SELECT transaction_id FROM daily_report_transactions)
            ORDER BY t.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let lines = sqlx::query_as::<_, TransactionLine>(
                r#"
                SELECT id, transaction_id, product_id, name_snapshot,
                       unit_price_laari, wholesale_price_laari, quantity
                FROM transaction_lines
                WHERE transaction_id = ?1
                ORDER BY id
                "#,
            )
            .bind(&transaction.id)
            .fetch_all(&self.pool)
            .await?;

            let return_lines = sqlx::query_as::<_, ReturnLine>(
                r#"
                SELECT rl.id, rl.return_event_id, rl.product_id, rl.quantity, rl.reason
                FROM return_lines rl
                JOIN return_events re ON re.id = rl.return_event_id
                WHERE re.transaction_id = ?1
                "#,
            )
            .bind(&transaction.id)
            .fetch_all(&self.pool)
            .await?;

            let gift_card_payments = sqlx::query_as::<_, GiftCardPayment>(
                r#"
                SELECT id, transaction_id, card_id, amount_laari
                FROM gift_card_payments
                WHERE transaction_id = ?1
                "#,
            )
            .bind(&transaction.id)
            .fetch_all(&self.pool)
            .await?;

            candidates.push(ReportCandidate {
                transaction,
                lines,
                return_lines,
                gift_card_payments,
            });
        }

        Ok(candidates)
    }

    /// Persists a daily report and its transaction partition atomically.
    pub async fn insert_daily_report(
        &self,
        report: &DailyReport,
        transaction_ids: &[String],
    ) -> DbResult<()> {
        info!(
            id = %report.id,
            transactions = transaction_ids.len(),
            "Persisting daily report"
        );

        let breakdown = serde_json::to_string(&report.payment_breakdown)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO daily_reports (
                id, report_date, total_sales_laari, total_discounts_laari,
                total_returns_value_laari, net_sales_laari, total_profit_laari,
                payment_breakdown, transaction_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&report.id)
        .bind(report.report_date)
        .bind(report.total_sales_laari)
        .bind(report.total_discounts_laari)
        .bind(report.total_returns_value_laari)
        .bind(report.net_sales_laari)
        .bind(report.total_profit_laari)
        .bind(breakdown)
        .bind(report.transaction_count)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await?;

        for transaction_id in transaction_ids {
            sqlx::query(
                "INSERT INTO daily_report_transactions (report_id, transaction_id) VALUES (?1, ?2)",
            )
            .bind(&report.id)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a daily report by ID.
    pub async fn get_daily_report(&self, id: &str) -> DbResult<Option<DailyReport>> {
        let row = sqlx::query(
            r#"
            SELECT id, report_date, total_sales_laari, total_discounts_laari,
                   total_returns_value_laari, net_sales_laari, total_profit_laari,
                   payment_breakdown, transaction_count, created_at
            FROM daily_reports
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_daily_report).transpose()
    }

    /// Lists daily reports, newest first.
    pub async fn list_daily_reports(&self, limit: u32) -> DbResult<Vec<DailyReport>> {
        let rows = sqlx::query(
            r#"
            SELECT id, report_date, total_sales_laari, total_discounts_laari,
                   total_returns_value_laari, net_sales_laari, total_profit_laari,
                   payment_breakdown, transaction_count, created_at
            FROM daily_reports
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_daily_report).collect()
    }

    /// The transaction ids partitioned into a report.
    pub async fn transactions_of_report(&self, report_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT transaction_id FROM daily_report_transactions WHERE report_id = ?1",
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Manual mapping: the breakdown column is JSON, so the row cannot be
    /// derived with FromRow.
    fn row_to_daily_report(row: sqlx::sqlite::SqliteRow) -> DbResult<DailyReport> {
        let breakdown_json: String = row.try_get("payment_breakdown")?;
        let payment_breakdown: Vec<MethodTotal> = serde_json::from_str(&breakdown_json)?;

        Ok(DailyReport {
            id: row.try_get("id")?,
            report_date: row.try_get("report_date")?,
            total_sales_laari: row.try_get("total_sales_laari")?,
            total_discounts_laari: row.try_get("total_discounts_laari")?,
            total_returns_value_laari: row.try_get("total_returns_value_laari")?,
            net_sales_laari: row.try_get("net_sales_laari")?,
            total_profit_laari: row.try_get("total_profit_laari")?,
            payment_breakdown,
            transaction_count: row.try_get("transaction_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    // -------------------------------------------------------------------------
    // Monthly statements
    // -------------------------------------------------------------------------

    /// Persists a statement and its covered transactions atomically.
    pub async fn insert_statement(
        &self,
        statement: &MonthlyStatement,
        transaction_ids: &[String],
    ) -> DbResult<()> {
        debug!(
            id = %statement.id,
            customer_id = %statement.customer_id,
            period = %statement.period,
            "Persisting monthly statement"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO monthly_statements (
                id, customer_id, period, total_due_laari,
                status, overdue_status, due_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&statement.id)
        .bind(&statement.customer_id)
        .bind(&statement.period)
        .bind(statement.total_due_laari)
        .bind(statement.status)
        .bind(statement.overdue_status)
        .bind(statement.due_date)
        .bind(statement.created_at)
        .execute(&mut *tx)
        .await?;

        for transaction_id in transaction_ids {
            sqlx::query(
                r#"
                INSERT INTO monthly_statement_transactions (statement_id, transaction_id)
                VALUES (?1, ?2)
                "#,
            )
            .bind(&statement.id)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a statement by ID.
    pub async fn get_statement(&self, id: &str) -> DbResult<Option<MonthlyStatement>> {
        let statement = sqlx::query_as::<_, MonthlyStatement>(
            r#"
            SELECT id, customer_id, period, total_due_laari,
                   status, overdue_status, due_date, created_at
            FROM monthly_statements
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(statement)
    }

    /// Gets a statement by ID, erroring when absent.
    pub async fn require_statement(&self, id: &str) -> DbResult<MonthlyStatement> {
        self.get_statement(id)
            .await?
            .ok_or_else(|| DbError::not_found("Statement", id))
    }

    /// Finds a customer's statement for one billing period.
    pub async fn statement_for(
        &self,
        customer_id: &str,
        period: &str,
    ) -> DbResult<Option<MonthlyStatement>> {
        let statement = sqlx::query_as::<_, MonthlyStatement>(
            r#"
            SELECT id, customer_id, period, total_due_laari,
                   status, overdue_status, due_date, created_at
            FROM monthly_statements
            WHERE customer_id = ?1 AND period = ?2
            "#,
        )
        .bind(customer_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;

        Ok(statement)
    }

    /// All statements still due (the overdue check's working set).
    pub async fn due_statements(&self) -> DbResult<Vec<MonthlyStatement>> {
        let statements = sqlx::query_as::<_, MonthlyStatement>(
            r#"
            SELECT id, customer_id, period, total_due_laari,
                   status, overdue_status, due_date, created_at
            FROM monthly_statements
            WHERE status = 'due'
            ORDER BY due_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(statements)
    }

    /// Escalates a statement to overdue. Guarded so escalation only fires
    /// once and only while the statement is still due.
    pub async fn mark_overdue(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE monthly_statements SET
                overdue_status = '7_days_overdue'
            WHERE id = ?1 AND status = 'due' AND overdue_status = 'none'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict(
                "Statement",
                id,
                "not due or already overdue",
            ));
        }

        Ok(())
    }

    /// Marks a statement paid (settlement clears the overdue state).
    pub async fn mark_paid(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE monthly_statements SET
                status = 'paid',
                overdue_status = 'none'
            WHERE id = ?1 AND status = 'due'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Statement", id, "not due"));
        }

        Ok(())
    }

    /// The transaction ids covered by a statement.
    pub async fn transactions_of_statement(&self, statement_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT transaction_id FROM monthly_statement_transactions WHERE statement_id = ?1",
        )
        .bind(statement_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// True while the customer has any statement still due and overdue;
    /// the credit block is cleared only when this turns false.
    pub async fn has_overdue_statements(&self, customer_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM monthly_statements
            WHERE customer_id = ?1 AND status = 'due' AND overdue_status = '7_days_overdue'
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use reef_core::types::{
        Customer, DailyReport, MonthlyStatement, OverdueStatus, PaymentMethod, PaymentStatus,
        StatementStatus, Transaction, TransactionRecord,
    };

    async fn seed_customer(db: &Database, id: &str) {
        db.customers()
            .insert(&Customer {
                id: id.to_string(),
                name: "Fathimath".to_string(),
                phone: None,
                max_credit_limit_laari: None,
                credit_blocked: false,
                loyalty_points: 0,
                loyalty_tier_id: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    async fn seed_transaction(db: &Database, id: &str, total: i64) {
        db.transactions()
            .insert_record(&TransactionRecord {
                transaction: Transaction {
                    id: id.to_string(),
                    customer_id: "c1".to_string(),
                    subtotal_laari: total,
                    discount_laari: 0,
                    promotion_code: None,
                    total_laari: total,
                    payment_status: PaymentStatus::Paid,
                    payment_method: PaymentMethod::Cash,
                    created_at: Utc::now(),
                },
                lines: vec![],
                gift_card_payments: vec![],
            })
            .await
            .unwrap();
    }

    fn report(id: &str, count: i64) -> DailyReport {
        DailyReport {
            id: id.to_string(),
            report_date: Utc::now().date_naive(),
            total_sales_laari: 1000,
            total_discounts_laari: 0,
            total_returns_value_laari: 0,
            net_sales_laari: 1000,
            total_profit_laari: 400,
            payment_breakdown: vec![],
            transaction_count: count,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_partition_excludes_reported_transactions() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db, "c1").await;
        seed_transaction(&db, "t1", 1000).await;
        seed_transaction(&db, "t2", 2000).await;

        let repo = db.reports();
        assert_eq!(repo.unreported_candidates().await.unwrap().len(), 2);

        repo.insert_daily_report(&report("z1", 2), &["t1".to_string(), "t2".to_string()])
            .await
            .unwrap();

        // Both transactions are now permanently out of the candidate pool.
        assert!(repo.unreported_candidates().await.unwrap().is_empty());

        // A transaction cannot land in a second report.
        assert!(repo
            .insert_daily_report(&report("z2", 1), &["t1".to_string()])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_daily_report_roundtrip_with_breakdown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.reports();

        let mut r = report("z1", 0);
        r.payment_breakdown = vec![reef_core::types::MethodTotal {
            method: PaymentMethod::Cash,
            amount_laari: 1000,
        }];
        repo.insert_daily_report(&r, &[]).await.unwrap();

        let loaded = repo.get_daily_report("z1").await.unwrap().unwrap();
        assert_eq!(loaded.payment_breakdown.len(), 1);
        assert_eq!(loaded.payment_breakdown[0].amount_laari, 1000);
    }

    #[tokio::test]
    async fn test_statement_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_customer(&db, "c1").await;
        let repo = db.reports();

        let statement = MonthlyStatement {
            id: "s1".to_string(),
            customer_id: "c1".to_string(),
            period: "2026-07".to_string(),
            total_due_laari: 15000,
            status: StatementStatus::Due,
            overdue_status: OverdueStatus::None,
            due_date: Utc::now(),
            created_at: Utc::now(),
        };
        repo.insert_statement(&statement, &[]).await.unwrap();

        repo.mark_overdue("s1").await.unwrap();
        let loaded = repo.require_statement("s1").await.unwrap();
        assert_eq!(loaded.overdue_status, OverdueStatus::SevenDaysOverdue);
        assert!(repo.has_overdue_statements("c1").await.unwrap());

        // Escalation fires only once.
        assert!(repo.mark_overdue("s1").await.is_err());

        repo.mark_paid("s1").await.unwrap();
        let loaded = repo.require_statement("s1").await.unwrap();
        assert_eq!(loaded.status, StatementStatus::Paid);
        assert_eq!(loaded.overdue_status, OverdueStatus::None);
        assert!(!repo.has_overdue_statements("c1").await.unwrap());
    }
}
