use kivu_core::UserId;
use kivu_orders::{Receipt, ReceiptId};

use super::{InMemoryReadStore, ReadStore};

/// Every receipt issued by order intake, in issue order.
#[derive(Debug, Default)]
pub struct ReceiptBook {
    store: InMemoryReadStore<ReceiptId, Receipt>,
}

impl ReceiptBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, receipt: Receipt) {
        self.store.upsert(receipt.receipt_id, receipt);
    }

    pub fn get(&self, receipt_id: &ReceiptId) -> Option<Receipt> {
        self.store.get(receipt_id)
    }

    /// A buyer's receipts, oldest first.
    pub fn list_for_buyer(&self, buyer_id: UserId) -> Vec<Receipt> {
        self.store
            .list()
            .into_iter()
            .filter(|r| r.buyer_id == buyer_id)
            .collect()
    }
}
