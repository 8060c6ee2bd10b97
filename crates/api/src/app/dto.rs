use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kivu_core::{DomainError, DomainResult, FieldViolation, Money, UserId};
use kivu_events::EventEnvelope;
use kivu_orders::{Cart, PurchaseIntent, Receipt};
use kivu_products::{Product, ProductDraft, ProductEvent, ProductFilter, ProductId, PurchaseType};

// -------------------------
// Request DTOs
// -------------------------

/// Seller submission body. Required numbers are optional here so that a
/// missing field is reported as a violation rather than a decoding failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmitProductRequest {
    pub name: String,
    pub name_localized: BTreeMap<String, String>,
    pub description: String,
    pub description_localized: BTreeMap<String, String>,
    pub category: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub regular_price: Option<f64>,
    pub per_item_price: Option<f64>,
    pub pool_price: Option<f64>,
    pub pool_size: Option<i64>,
    pub pool_current: Option<i64>,
    pub rating: Option<f64>,
}

impl SubmitProductRequest {
    pub fn into_draft(self) -> DomainResult<ProductDraft> {
        let missing: Vec<FieldViolation> = [
            ("regularPrice", self.regular_price.is_none()),
            ("perItemPrice", self.per_item_price.is_none()),
            ("poolPrice", self.pool_price.is_none()),
            ("poolSize", self.pool_size.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| FieldViolation::new(field, "is required"))
        .collect();
        if !missing.is_empty() {
            return Err(DomainError::Validation(missing));
        }

        Ok(ProductDraft {
            name: self.name,
            name_localized: self.name_localized,
            description: self.description,
            description_localized: self.description_localized,
            category: self.category,
            image: self.image,
            images: self.images,
            regular_price: self.regular_price.unwrap_or_default(),
            per_item_price: self.per_item_price.unwrap_or_default(),
            pool_price: self.pool_price.unwrap_or_default(),
            pool_size: self.pool_size.unwrap_or_default(),
            pool_current: self.pool_current,
            rating: self.rating,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

impl RejectRequest {
    /// Reason carried by a raw reject body. An empty body carries none; any
    /// other body must be a valid JSON object.
    pub fn reason_from_body(body: &[u8]) -> Result<Option<String>, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice::<Self>(body).map(|r| r.reason)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub product_id: String,
    pub quantity: i64,
    pub purchase_type: String,
}

impl PurchaseRequest {
    /// Build the intent for `buyer_id`, collecting every malformed field.
    pub fn into_intent(self, buyer_id: UserId) -> DomainResult<PurchaseIntent> {
        let mut violations = Vec::new();

        let product_id = self
            .product_id
            .parse::<ProductId>()
            .map_err(|_| violations.push(FieldViolation::new("productId", "is not a valid product id")))
            .ok();
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .or_else(|| {
                violations.push(FieldViolation::new("quantity", "must be at least 1"));
                None
            });
        let purchase_type = self
            .purchase_type
            .parse::<PurchaseType>()
            .map_err(|e| violations.extend(e.violations().iter().cloned()))
            .ok();

        match (product_id, quantity, purchase_type) {
            (Some(product_id), Some(quantity), Some(purchase_type)) => Ok(PurchaseIntent {
                product_id,
                quantity,
                purchase_type,
                buyer_id,
            }),
            _ => Err(DomainError::Validation(violations)),
        }
    }
}

/// Catalog query string: `?category=&q=&minPrice=&maxPrice=`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ListQuery {
    pub fn into_filter(self) -> DomainResult<ProductFilter> {
        let mut violations = Vec::new();
        let mut bound = |field: &str, amount: Option<f64>| {
            amount.and_then(|a| {
                Money::from_decimal(field, a)
                    .map_err(|e| violations.extend(e.violations().iter().cloned()))
                    .ok()
            })
        };
        let min_price = bound("minPrice", self.min_price);
        let max_price = bound("maxPrice", self.max_price);
        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }

        Ok(ProductFilter {
            category: self.category,
            text_query: self.q,
            min_price,
            max_price,
            seller_id: None,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub name_localized: BTreeMap<String, String>,
    pub description: String,
    pub description_localized: BTreeMap<String, String>,
    pub category: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub regular_price: f64,
    pub per_item_price: f64,
    pub pool_price: f64,
    pub pool_size: u32,
    pub pool_current: u32,
    pub rating: f64,
    pub moderation_state: &'static str,
    pub seller_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub discount_percent: u32,
    pub pool_completion_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated_at: Option<DateTime<Utc>>,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id_typed().to_string(),
            name: p.name().to_string(),
            name_localized: p.name_localized().clone(),
            description: p.description().to_string(),
            description_localized: p.description_localized().clone(),
            category: p.category().to_string(),
            image: p.main_image().map(str::to_string),
            images: p.images().to_vec(),
            regular_price: p.regular_price().to_decimal(),
            per_item_price: p.per_item_price().to_decimal(),
            pool_price: p.pool_price().to_decimal(),
            pool_size: p.pool_size(),
            pool_current: p.pool_current(),
            rating: p.rating(),
            moderation_state: p.moderation_state().as_str(),
            seller_id: p.seller_id().map(|s| s.to_string()),
            created_at: p.created_at(),
            discount_percent: p.discount_percent(),
            pool_completion_ratio: p.pool_completion_ratio(),
            rejection_reason: p.rejection_reason().map(str::to_string),
            moderated_at: p.moderated_at(),
        }
    }
}

pub fn products_to_json(products: &[Product]) -> serde_json::Value {
    let items = products.iter().map(ProductResponse::from).collect::<Vec<_>>();
    serde_json::json!({ "items": items })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub receipt_id: String,
    pub product_id: String,
    pub buyer_id: String,
    pub purchase_type: &'static str,
    pub unit_price: f64,
    pub quantity: u32,
    pub line_total: f64,
    pub pool_completed: bool,
    pub pool_current: u32,
    pub issued_at: DateTime<Utc>,
}

impl From<&Receipt> for ReceiptResponse {
    fn from(r: &Receipt) -> Self {
        Self {
            receipt_id: r.receipt_id.to_string(),
            product_id: r.product_id.to_string(),
            buyer_id: r.buyer_id.to_string(),
            purchase_type: r.purchase_type.as_str(),
            unit_price: r.unit_price.to_decimal(),
            quantity: r.quantity,
            line_total: r.line_total.to_decimal(),
            pool_completed: r.pool_completed,
            pool_current: r.pool_current,
            issued_at: r.issued_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub product_id: String,
    pub purchase_type: &'static str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub buyer_id: String,
    pub items: Vec<CartLineResponse>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Cart> for CartResponse {
    fn from(c: &Cart) -> Self {
        Self {
            buyer_id: c.buyer_id().to_string(),
            items: c
                .lines()
                .iter()
                .map(|l| CartLineResponse {
                    product_id: l.product_id.to_string(),
                    purchase_type: l.purchase_type.as_str(),
                    quantity: l.quantity,
                })
                .collect(),
            updated_at: c.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<'a> {
    pub sequence_number: u64,
    pub event_type: &'a str,
    pub occurred_at: DateTime<Utc>,
    pub payload: &'a ProductEvent,
}

impl<'a> From<&'a EventEnvelope<ProductEvent>> for HistoryEntry<'a> {
    fn from(e: &'a EventEnvelope<ProductEvent>) -> Self {
        Self {
            sequence_number: e.sequence_number(),
            event_type: e.event_type(),
            occurred_at: e.occurred_at(),
            payload: e.payload(),
        }
    }
}
