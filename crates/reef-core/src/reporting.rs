//! # Reconciliation Reporting Rules
//!
//! Pure aggregation for the end-of-day (Z) report and monthly statements.
//! Which transactions form the candidate set, and the guarantee that a
//! reported transaction is never reported again, lives at the persistence
//! layer; this module only computes the figures.
//!
//! ## Daily Report Figures
//! ```text
//! total_sales         = Σ total over the candidate set
//! total_discounts     = Σ discount
//! total_returns_value = Σ (sale unit price × returned qty)
//! net_sales           = total_sales − total_returns_value
//! total_profit        = net_sales − Σ (wholesale × net qty per line)
//! payment_breakdown   = per-method totals; `multiple` split heuristically
//! ```
//!
//! The `multiple` split reproduces the till's heuristic: the gift-card
//! portion is the sum of recorded gift-card payments, the remainder is
//! attributed to card. It is not an exact tender derivation.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    GiftCardPayment, MethodTotal, MonthlyStatement, PaymentMethod, ReturnLine, StatementStatus,
    Transaction, TransactionLine,
};
use crate::validation::validate_period;

// =============================================================================
// Daily (Z-) Report Aggregation
// =============================================================================

/// Days after the due date before a statement escalates to overdue.
pub const OVERDUE_GRACE_DAYS: i64 = 7;

/// Payment term granted on a monthly statement, from the end of the period.
pub const STATEMENT_TERM_DAYS: i64 = 14;

/// Fixed output order for payment breakdown rows.
const METHOD_ORDER: [PaymentMethod; 6] = [
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::Transfer,
    PaymentMethod::GiftCard,
    PaymentMethod::Credit,
    PaymentMethod::Multiple,
];

/// One not-yet-reported transaction with everything the aggregation needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCandidate {
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
    pub return_lines: Vec<ReturnLine>,
    pub gift_card_payments: Vec<GiftCardPayment>,
}

/// Aggregate figures for one daily report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub total_sales: Money,
    pub total_discounts: Money,
    pub total_returns_value: Money,
    pub net_sales: Money,
    pub total_profit: Money,
    pub payment_breakdown: Vec<MethodTotal>,
    pub transaction_count: i64,
}

/// Aggregates a candidate set into daily report figures.
pub fn summarize_day(candidates: &[ReportCandidate]) -> DailyTotals {
    let mut total_sales = Money::zero();
    let mut total_discounts = Money::zero();
    let mut total_returns_value = Money::zero();
    let mut cost_of_goods = Money::zero();
    let mut by_method: HashMap<PaymentMethod, i64> = HashMap::new();

    for candidate in candidates {
        let txn = &candidate.transaction;
        total_sales += txn.total();
        total_discounts += txn.discount();
        total_returns_value += returns_value(candidate);
        cost_of_goods += net_cost_of_goods(candidate);

        for (method, amount) in apportion_payment(txn, &candidate.gift_card_payments) {
            *by_method.entry(method).or_insert(0) += amount.laari();
        }
    }

    let net_sales = total_sales - total_returns_value;

    let payment_breakdown = METHOD_ORDER
        .iter()
        .filter_map(|method| {
            by_method.get(method).map(|&amount_laari| MethodTotal {
                method: *method,
                amount_laari,
            })
        })
        .collect();

    DailyTotals {
        total_sales,
        total_discounts,
        total_returns_value,
        net_sales,
        total_profit: net_sales - cost_of_goods,
        payment_breakdown,
        transaction_count: candidates.len() as i64,
    }
}

/// Value of everything returned against a candidate, at sale prices.
fn returns_value(candidate: &ReportCandidate) -> Money {
    candidate
        .return_lines
        .iter()
        .map(|ret| {
            candidate
                .lines
                .iter()
                .find(|l| l.product_id == ret.product_id)
                .map(|l| l.unit_price().multiply_quantity(ret.quantity))
                .unwrap_or_else(Money::zero)
        })
        .sum()
}

/// Wholesale cost of the goods that actually left the shop: purchased
/// quantities net of returns, at the wholesale prices frozen on the lines.
fn net_cost_of_goods(candidate: &ReportCandidate) -> Money {
    let mut returned: HashMap<&str, i64> = HashMap::new();
    for ret in &candidate.return_lines {
        *returned.entry(ret.product_id.as_str()).or_insert(0) += ret.quantity;
    }

    let mut cost = Money::zero();
    for line in &candidate.lines {
        // Allocate returned quantity greedily across lines of the product.
        let r = returned.entry(line.product_id.as_str()).or_insert(0);
        let deducted = (*r).min(line.quantity);
        *r -= deducted;

        let net_qty = line.quantity - deducted;
        cost += Money::from_laari(line.wholesale_price_laari).multiply_quantity(net_qty);
    }
    cost
}

/// Splits one transaction's total across payment methods.
///
/// `multiple` is the heuristic split: gift-card portion from the recorded
/// gift-card payments, remainder to card.
fn apportion_payment(
    txn: &Transaction,
    gift_payments: &[GiftCardPayment],
) -> Vec<(PaymentMethod, Money)> {
    match txn.payment_method {
        PaymentMethod::Multiple => {
            // The stored total is already net of the gift-card deduction,
            // so the card slice is the total itself.
            let gift: Money = gift_payments.iter().map(GiftCardPayment::amount).sum();
            let mut parts = Vec::new();
            if gift.is_positive() {
                parts.push((PaymentMethod::GiftCard, gift));
            }
            parts.push((PaymentMethod::Card, txn.total()));
            parts
        }
        method => vec![(method, txn.total())],
    }
}

// =============================================================================
// Monthly Statements
// =============================================================================

/// Sums the statement total over a customer's unpaid transactions.
pub fn statement_total(transactions: &[Transaction]) -> Money {
    transactions.iter().map(Transaction::total).sum()
}

/// Resolves a `YYYY-MM` period into `[start, end)` UTC instants.
pub fn period_bounds(period: &str) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
    validate_period(period)?;
    let year: i32 = period[..4].parse().map_err(|_| ValidationError::InvalidFormat {
        field: "period".to_string(),
        reason: "must be YYYY-MM".to_string(),
    })?;
    let month: u32 = period[5..].parse().map_err(|_| ValidationError::InvalidFormat {
        field: "period".to_string(),
        reason: "must be YYYY-MM".to_string(),
    })?;

    let month_start = |y: i32, m: u32| {
        NaiveDate::from_ymd_opt(y, m, 1)
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: "invalid month".to_string(),
            })
    };

    let start = month_start(year, month)?;
    let end = if month == 12 {
        month_start(year + 1, 1)?
    } else {
        month_start(year, month + 1)?
    };

    Ok((start, end))
}

/// Due date for a period's statement: end of the period plus the payment
/// term.
pub fn statement_due_date(period: &str) -> CoreResult<DateTime<Utc>> {
    let (_, end) = period_bounds(period)?;
    Ok(end + Duration::days(STATEMENT_TERM_DAYS))
}

/// The `YYYY-MM` period a timestamp falls into.
pub fn period_of(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Whether the periodic check should escalate this statement to overdue.
///
/// Escalation fires once the due date is [`OVERDUE_GRACE_DAYS`] behind,
/// while the statement is still due; it is independent of any payment
/// arriving later the same day.
pub fn escalates_to_overdue(statement: &MonthlyStatement, now: DateTime<Utc>) -> bool {
    statement.status == StatementStatus::Due
        && now >= statement.due_date + Duration::days(OVERDUE_GRACE_DAYS)
}

// =============================================================================
// Unit Tests
// =============================================================================
