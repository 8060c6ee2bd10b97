//! Dual-pricing model: individual vs pool (group-buy) pricing.
//!
//! Pure functions only.

use serde::{Deserialize, Serialize};

use kivu_core::{DomainError, DomainResult, Money};

use crate::Product;

/// How a buyer intends to purchase a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    Individual,
    Pool,
}

impl PurchaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseType::Individual => "individual",
            PurchaseType::Pool => "pool",
        }
    }
}

impl core::str::FromStr for PurchaseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "individual" => Ok(PurchaseType::Individual),
            "pool" => Ok(PurchaseType::Pool),
            _ => Err(DomainError::validation(
                "purchaseType",
                "must be one of: individual, pool",
            )),
        }
    }
}

/// Whole-number discount of the pool price against the regular price.
///
/// `round(100 × (regular − pool) / regular)`, rounded half-up. Zero when the
/// regular price is zero or the pool price is not below it.
pub fn discount_percent(regular_price: Money, pool_price: Money) -> u32 {
    let regular = u128::from(regular_price.cents());
    let pool = u128::from(pool_price.cents());
    if regular == 0 || pool >= regular {
        return 0;
    }
    let percent = (200 * (regular - pool) + regular) / (2 * regular);
    // At most 100 since pool < regular.
    percent as u32
}

/// Fraction of the pool target already committed, clamped to `[0, 1]`.
pub fn pool_completion_ratio(pool_current: u32, pool_size: u32) -> f64 {
    if pool_size == 0 || pool_current >= pool_size {
        return 1.0;
    }
    f64::from(pool_current) / f64::from(pool_size)
}

/// Whether the pool counter has reached (or passed) its target.
pub fn is_pool_complete(pool_current: u32, pool_size: u32) -> bool {
    pool_current >= pool_size
}

/// Unit price applicable to a purchase type.
pub fn effective_unit_price(product: &Product, purchase_type: PurchaseType) -> Money {
    match purchase_type {
        PurchaseType::Individual => product.per_item_price(),
        PurchaseType::Pool => product.pool_price(),
    }
}

/// `unit_price × quantity`.
///
/// Amounts are whole cents, so the product is already rounded to two decimals.
pub fn line_total(unit_price: Money, quantity: u32) -> DomainResult<Money> {
    unit_price
        .checked_times(quantity)
        .ok_or_else(|| DomainError::validation("quantity", "line total is too large"))
}
