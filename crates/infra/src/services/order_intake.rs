use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use kivu_core::{DomainError, DomainResult, UserId};
use kivu_orders::{PurchaseIntent, Receipt, ReceiptId, quote};

use super::{PoolLedger, ProductStreams};
use crate::command_dispatcher::DispatchError;
use crate::read_model::ReceiptBook;

/// Validates purchase intents and issues receipts.
///
/// Orchestration only: pricing and eligibility come from the domain crates.
/// The pool commitment is the last fallible step, so an intent that fails
/// validation or pricing never touches the pool counter.
#[derive(Debug, Clone)]
pub struct OrderIntake {
    products: Arc<ProductStreams>,
    pool_ledger: PoolLedger,
    receipts: Arc<ReceiptBook>,
}

impl OrderIntake {
    pub fn new(products: Arc<ProductStreams>, pool_ledger: PoolLedger, receipts: Arc<ReceiptBook>) -> Self {
        Self {
            products,
            pool_ledger,
            receipts,
        }
    }

    pub fn submit_purchase_intent(&self, intent: &PurchaseIntent) -> Result<Receipt, DispatchError> {
        let product = self.products.current(intent.product_id)?;
        let quote = quote(&product, intent)?;

        let pool = if quote.commits_to_pool() {
            self.pool_ledger.commit_to_pool(intent.product_id, quote.quantity)?
        } else {
            product.pool_commitment()
        };

        let receipt = Receipt::issue(&quote, intent.buyer_id, pool, Utc::now());
        self.receipts.record(receipt.clone());

        info!(
            receipt_id = %receipt.receipt_id,
            product_id = %receipt.product_id,
            buyer_id = %receipt.buyer_id,
            purchase_type = receipt.purchase_type.as_str(),
            quantity = receipt.quantity,
            line_total = %receipt.line_total,
            "purchase intent accepted"
        );
        Ok(receipt)
    }

    /// A buyer's receipts, oldest first.
    pub fn receipts_for(&self, buyer_id: UserId) -> Vec<Receipt> {
        self.receipts.list_for_buyer(buyer_id)
    }

    /// One of the buyer's receipts. Another buyer's receipt is reported as
    /// not found.
    pub fn receipt_for(&self, buyer_id: UserId, receipt_id: ReceiptId) -> DomainResult<Receipt> {
        self.receipts
            .get(&receipt_id)
            .filter(|r| r.buyer_id == buyer_id)
            .ok_or_else(|| DomainError::not_found("order", receipt_id))
    }
}
