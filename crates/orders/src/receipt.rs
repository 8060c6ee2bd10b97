use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kivu_core::{DomainError, Money, UserId};
use kivu_products::{PoolCommitment, ProductId, PurchaseType};

use crate::intent::Quote;

/// Receipt identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(Uuid);

impl ReceiptId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl core::str::FromStr for ReceiptId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("ReceiptId: {e}")))
    }
}

impl Default for ReceiptId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of an accepted purchase intent.
///
/// A computation, not a financial record: there is no payment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_id: ReceiptId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub purchase_type: PurchaseType,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    /// Pool state after the purchase (unchanged for individual purchases).
    pub pool_completed: bool,
    pub pool_current: u32,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    pub fn issue(
        quote: &Quote,
        buyer_id: UserId,
        pool: PoolCommitment,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            receipt_id: ReceiptId::new(),
            product_id: quote.product_id,
            buyer_id,
            purchase_type: quote.purchase_type,
            unit_price: quote.unit_price,
            quantity: quote.quantity,
            line_total: quote.line_total,
            pool_completed: pool.pool_completed,
            pool_current: pool.new_pool_current,
            issued_at,
        }
    }
}
