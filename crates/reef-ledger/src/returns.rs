//! # Returns Processing
//!
//! Validates a partial return against everything already returned on the
//! transaction, appends one return event, restores stock through the audit
//! path, and optionally issues store credit.
//!
//! Validation is all-or-nothing: one bad line rejects the whole request and
//! nothing is written. Bundle lines restore their components with exactly
//! the decomposition the sale used.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use reef_core::returns;
use reef_core::stock::plan_return_deltas;
use reef_core::types::{
    GiftCard, InventoryEventType, ReturnEvent, ReturnLine, ReturnRequestLine,
};
use reef_db::{DbError, GiftCardRepository, InventoryRepository, TransactionRepository};

use crate::catalog::new_gift_card_code;
use crate::error::LedgerResult;
use crate::notify::NotificationTopic;
use crate::Ledger;

/// A requested return against one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub transaction_id: String,
    pub lines: Vec<ReturnRequestLine>,
    /// Issue the refund value as a gift card owned by the transaction's
    /// customer instead of cash.
    pub issue_store_credit: bool,
}

/// The outcome of a processed return.
#[derive(Debug, Clone)]
pub struct ProcessedReturn {
    pub event: ReturnEvent,
    pub lines: Vec<ReturnLine>,
    /// The store-credit card, when one was requested and the return had
    /// value.
    pub store_credit: Option<GiftCard>,
}

impl Ledger {
    /// Processes a return: validates cumulatively against all prior return
    /// events, then appends the event, restores stock, and (optionally)
    /// issues store credit, all in one database transaction.
    pub async fn process_return(&self, request: ReturnRequest) -> LedgerResult<ProcessedReturn> {
        debug!(
            transaction_id = %request.transaction_id,
            lines = request.lines.len(),
            "Processing return"
        );

        let transactions = self.db().transactions();
        let transaction = transactions.require(&request.transaction_id).await?;
        let sale_lines = transactions.lines_of(&transaction.id).await?;
        let prior_returns = transactions.return_lines_of(&transaction.id).await?;

        returns::validate_return(&sale_lines, &prior_returns, &request.lines)?;

        let catalog = self.db().products().load_catalog().await?;
        let deltas = plan_return_deltas(&request.lines, &catalog)?;

        let now = Utc::now();
        let event = ReturnEvent {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction.id.clone(),
            created_at: now,
        };
        let return_lines: Vec<ReturnLine> = request
            .lines
            .iter()
            .map(|line| ReturnLine {
                id: Uuid::new_v4().to_string(),
                return_event_id: event.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                reason: line.reason.clone(),
            })
            .collect();

        let store_credit = if request.issue_store_credit {
            let value = returns::store_credit_value(&sale_lines, &request.lines);
            value.is_positive().then(|| GiftCard {
                id: new_gift_card_code(),
                initial_balance_laari: value.laari(),
                current_balance_laari: value.laari(),
                is_enabled: true,
                customer_id: Some(transaction.customer_id.clone()),
                expires_at: None,
                created_at: now,
            })
        } else {
            None
        };

        let mut tx = self.db().pool().begin().await.map_err(DbError::from)?;

        TransactionRepository::append_return_in(&mut tx, &event, &return_lines).await?;

        for delta in &deltas {
            InventoryRepository::apply_delta_in(
                &mut tx,
                &delta.product_id,
                delta.delta,
                InventoryEventType::Return,
                Some(&transaction.id),
                None,
            )
            .await?;
        }

        if let Some(card) = &store_credit {
            GiftCardRepository::issue_in(&mut tx, card).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %transaction.id,
            event_id = %event.id,
            lines = return_lines.len(),
            store_credit = store_credit.is_some(),
            "Return processed"
        );

        self.notifier
            .emit(NotificationTopic::Return, "Return processed");
        if let Some(card) = &store_credit {
            self.notifier.emit(
                NotificationTopic::Return,
                format!("Store credit issued: {}", card.balance()),
            );
        }

        Ok(ProcessedReturn {
            event,
            lines: return_lines,
            store_credit,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
