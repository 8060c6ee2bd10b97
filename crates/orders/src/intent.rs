use serde::{Deserialize, Serialize};

use kivu_core::{DomainError, DomainResult, Money, UserId};
use kivu_products::{Product, ProductId, PurchaseType, effective_unit_price, line_total};

/// A buyer's request to purchase a product. Never persisted as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntent {
    pub product_id: ProductId,
    pub quantity: u32,
    pub purchase_type: PurchaseType,
    pub buyer_id: UserId,
}

/// Priced, validated intent. Computing one has no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub product_id: ProductId,
    pub purchase_type: PurchaseType,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl Quote {
    /// Whether fulfilling this quote advances the product's pool counter.
    pub fn commits_to_pool(&self) -> bool {
        self.purchase_type == PurchaseType::Pool
    }
}

/// Validate `intent` against a product snapshot and price it.
pub fn quote(product: &Product, intent: &PurchaseIntent) -> DomainResult<Quote> {
    if product.id_typed() != intent.product_id {
        return Err(DomainError::invalid_id(format!(
            "intent targets product {}, snapshot is {}",
            intent.product_id,
            product.id_typed()
        )));
    }
    if !product.is_created() {
        return Err(DomainError::not_found("product", intent.product_id));
    }
    if !product.is_approved() {
        return Err(DomainError::invalid_state(
            "product",
            intent.product_id,
            format!(
                "product is {} and cannot be purchased",
                product.moderation_state()
            ),
        ));
    }
    if intent.quantity < 1 {
        return Err(DomainError::validation("quantity", "must be at least 1"));
    }

    let unit_price = effective_unit_price(product, intent.purchase_type);
    let line_total = line_total(unit_price, intent.quantity)?;

    Ok(Quote {
        product_id: intent.product_id,
        purchase_type: intent.purchase_type,
        unit_price,
        quantity: intent.quantity,
        line_total,
    })
}
