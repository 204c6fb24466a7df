//! # Reconciliation Reporting
//!
//! The end-of-day (Z-) report and per-customer monthly statements.
//!
//! ## The Two Partitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Z-REPORT     candidates = every transaction not yet in a report.       │
//! │               Persisting the report freezes its partition; a second     │
//! │               run with no new sales produces an empty report.           │
//! │                                                                         │
//! │  STATEMENT    one customer's unpaid transactions in one billing         │
//! │               period. due → (time passes) → overdue escalation sets     │
//! │               the customer's credit block; settlement marks the         │
//! │               covered transactions paid and clears the block once no    │
//! │               overdue statement remains.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use reef_core::reporting;
use reef_core::types::{
    DailyReport, MonthlyStatement, OverdueStatus, PaymentStatus, StatementStatus,
};

use crate::error::{LedgerError, LedgerResult};
use crate::notify::NotificationTopic;
use crate::Ledger;

impl Ledger {
    /// Generates and persists a daily (Z-) report over every transaction
    /// not yet partitioned into a prior report.
    ///
    /// The report and its partition rows land in one database transaction;
    /// once persisted, those transactions are permanently out of the
    /// candidate pool. Running again with no new sales yields an empty
    /// report.
    pub async fn generate_daily_report(&self) -> LedgerResult<DailyReport> {
        let candidates = self.db().reports().unreported_candidates().await?;
        let totals = reporting::summarize_day(&candidates);

        let now = Utc::now();
        let report = DailyReport {
            id: Uuid::new_v4().to_string(),
            report_date: now.date_naive(),
            total_sales_laari: totals.total_sales.laari(),
            total_discounts_laari: totals.total_discounts.laari(),
            total_returns_value_laari: totals.total_returns_value.laari(),
            net_sales_laari: totals.net_sales.laari(),
            total_profit_laari: totals.total_profit.laari(),
            payment_breakdown: totals.payment_breakdown,
            transaction_count: totals.transaction_count,
            created_at: now,
        };

        let transaction_ids: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.transaction.id.clone())
            .collect();
        self.db()
            .reports()
            .insert_daily_report(&report, &transaction_ids)
            .await?;

        info!(
            id = %report.id,
            transactions = report.transaction_count,
            net_sales = %report.net_sales_laari,
            "Daily report generated"
        );
        self.notifier.emit(
            NotificationTopic::Report,
            format!(
                "Z-report generated: {} transaction(s)",
                report.transaction_count
            ),
        );
        Ok(report)
    }

    /// Generates a customer's monthly statement: their unpaid transactions
    /// in the billing period, one statement, one due date.
    pub async fn generate_statement(
        &self,
        customer_id: &str,
        period: &str,
    ) -> LedgerResult<MonthlyStatement> {
        if self
            .db()
            .reports()
            .statement_for(customer_id, period)
            .await?
            .is_some()
        {
            return Err(LedgerError::StatementExists {
                customer_id: customer_id.to_string(),
                period: period.to_string(),
            });
        }

        let (start, end) = reporting::period_bounds(period)?;
        let transactions = self
            .db()
            .transactions()
            .unpaid_in_period(customer_id, start, end)
            .await?;
        let total_due = reporting::statement_total(&transactions);

        let statement = MonthlyStatement {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            period: period.to_string(),
            total_due_laari: total_due.laari(),
            status: StatementStatus::Due,
            overdue_status: OverdueStatus::None,
            due_date: reporting::statement_due_date(period)?,
            created_at: Utc::now(),
        };
        let transaction_ids: Vec<String> =
            transactions.iter().map(|txn| txn.id.clone()).collect();
        self.db()
            .reports()
            .insert_statement(&statement, &transaction_ids)
            .await?;

        info!(
            id = %statement.id,
            customer_id = %customer_id,
            period = %period,
            total_due = %total_due,
            "Monthly statement generated"
        );
        Ok(statement)
    }

    /// The periodic overdue check: escalates every statement whose due
    /// date is more than the grace period behind and blocks the customer's
    /// credit. Returns how many statements escalated.
    ///
    /// `now` is passed in so the caller's scheduler (and the tests) own
    /// the clock.
    pub async fn run_overdue_check(&self, now: DateTime<Utc>) -> LedgerResult<usize> {
        let due = self.db().reports().due_statements().await?;
        let mut escalated = 0;

        for statement in due {
            if statement.overdue_status != OverdueStatus::None {
                continue;
            }
            if !reporting::escalates_to_overdue(&statement, now) {
                continue;
            }

            self.db().reports().mark_overdue(&statement.id).await?;
            self.db()
                .customers()
                .set_credit_blocked(&statement.customer_id, true)
                .await?;

            warn!(
                statement_id = %statement.id,
                customer_id = %statement.customer_id,
                "Statement overdue; customer credit blocked"
            );
            self.notifier.emit(
                NotificationTopic::Credit,
                format!(
                    "Statement {} is 7 days overdue; credit blocked",
                    statement.period
                ),
            );
            escalated += 1;
        }

        Ok(escalated)
    }

    /// Settles a statement: marks its covered transactions paid, the
    /// statement itself paid, and clears the customer's credit block once
    /// no overdue statement remains.
    pub async fn settle_statement(&self, statement_id: &str) -> LedgerResult<()> {
        let statement = self.db().reports().require_statement(statement_id).await?;
        let transaction_ids = self
            .db()
            .reports()
            .transactions_of_statement(statement_id)
            .await?;

        for transaction_id in &transaction_ids {
            self.db()
                .transactions()
                .set_payment_status(transaction_id, PaymentStatus::Paid)
                .await?;
        }
        self.db().reports().mark_paid(statement_id).await?;

        if !self
            .db()
            .reports()
            .has_overdue_statements(&statement.customer_id)
            .await?
        {
            self.db()
                .customers()
                .set_credit_blocked(&statement.customer_id, false)
                .await?;
            self.notifier.emit(
                NotificationTopic::Credit,
                "All overdue balances settled; credit restored",
            );
        }

        info!(
            statement_id = %statement_id,
            transactions = transaction_ids.len(),
            "Statement settled"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
