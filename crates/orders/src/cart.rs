//! Buyer carts: purchase intents collected before checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kivu_core::{DomainError, DomainResult, UserId};
use kivu_products::{ProductId, PurchaseType};

use crate::intent::PurchaseIntent;

/// Units of one product, bought one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub purchase_type: PurchaseType,
    pub quantity: u32,
}

/// A buyer's cart.
///
/// Lines are keyed by product and purchase type: adding the same product the
/// same way again grows the existing line, while a pool line and an individual
/// line for one product stay separate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    buyer_id: UserId,
    lines: Vec<CartLine>,
    updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new(buyer_id: UserId) -> Self {
        Self {
            buyer_id,
            lines: Vec::new(),
            updated_at: None,
        }
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Add `quantity` units, merging into the matching line. Returns the line.
    pub fn add(
        &mut self,
        product_id: ProductId,
        purchase_type: PurchaseType,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> DomainResult<CartLine> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity", "must be at least 1"));
        }

        let existing = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id && l.purchase_type == purchase_type);
        let line = match existing {
            Some(i) => {
                let line = &mut self.lines[i];
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::validation("quantity", "cart line quantity overflow"))?;
                *line
            }
            None => {
                let line = CartLine {
                    product_id,
                    purchase_type,
                    quantity,
                };
                self.lines.push(line);
                line
            }
        };
        self.updated_at = Some(at);
        Ok(line)
    }

    /// Drop every line for `product_id`, whatever its purchase type. Returns
    /// how many lines were removed.
    pub fn remove(&mut self, product_id: ProductId, at: DateTime<Utc>) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.updated_at = Some(at);
        before - self.lines.len()
    }

    pub fn clear(&mut self, at: DateTime<Utc>) {
        self.lines.clear();
        self.updated_at = Some(at);
    }

    /// Remove the first `count` lines (already fulfilled at checkout).
    pub fn drain_fulfilled(&mut self, count: usize, at: DateTime<Utc>) {
        self.lines.drain(..count.min(self.lines.len()));
        self.updated_at = Some(at);
    }

    /// One purchase intent per line, in line order.
    pub fn intents(&self) -> Vec<PurchaseIntent> {
        self.lines
            .iter()
            .map(|l| PurchaseIntent {
                product_id: l.product_id,
                quantity: l.quantity,
                purchase_type: l.purchase_type,
                buyer_id: self.buyer_id,
            })
            .collect()
    }
}
