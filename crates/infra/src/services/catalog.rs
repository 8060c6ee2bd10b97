use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use kivu_core::{AggregateId, DomainError, DomainResult, UserId};
use kivu_events::EventEnvelope;
use kivu_products::{
    ModerationState, Product, ProductCommand, ProductDraft, ProductEvent, ProductFilter, ProductId,
    SubmitProduct, derived_categories, newest_first,
};

use super::ProductStreams;
use crate::command_dispatcher::DispatchError;

/// Product counts per moderation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModerationSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

/// Product entity store and its queries.
///
/// Public listings only ever contain approved products; the moderation-facing
/// queries (`get_by_id`, `list_pending`, `list_all`, `list_by_seller`) do not
/// filter by state.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Arc<ProductStreams>,
    default_locale: String,
}

impl Catalog {
    pub fn new(products: Arc<ProductStreams>, default_locale: impl Into<String>) -> Self {
        Self {
            products,
            default_locale: default_locale.into(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Validate a seller's draft and create the product in `pending` state.
    pub fn submit(&self, seller_id: UserId, draft: ProductDraft) -> Result<Product, DispatchError> {
        let product_id = ProductId::new(AggregateId::new());
        let command = ProductCommand::SubmitProduct(SubmitProduct {
            product_id,
            seller_id,
            draft,
            default_locale: self.default_locale.clone(),
            occurred_at: Utc::now(),
        });

        let product = self.products.execute(&command)?;
        info!(
            product_id = %product_id,
            seller_id = %seller_id,
            category = product.category(),
            "product submitted for moderation"
        );
        Ok(product)
    }

    /// Any product, whatever its moderation state.
    pub fn get_by_id(&self, product_id: ProductId) -> DomainResult<Product> {
        self.products
            .view()
            .get(&product_id)
            .ok_or_else(|| DomainError::not_found("product", product_id))
    }

    /// Approved products matching `filter`, in submission order.
    pub fn list_approved(&self, filter: &ProductFilter) -> Vec<Product> {
        self.products
            .view()
            .list()
            .into_iter()
            .filter(|p| p.is_approved() && filter.matches(p))
            .collect()
    }

    /// Moderation queue, newest first.
    pub fn list_pending(&self) -> Vec<Product> {
        let pending = self
            .products
            .view()
            .list()
            .into_iter()
            .filter(|p| p.moderation_state() == ModerationState::Pending)
            .collect();
        newest_first(pending)
    }

    /// Distinct categories of approved products.
    pub fn derived_categories(&self) -> BTreeSet<String> {
        derived_categories(&self.products.view().list())
    }

    /// A seller's own products in any state, in submission order.
    pub fn list_by_seller(&self, seller_id: UserId) -> Vec<Product> {
        self.products
            .view()
            .list()
            .into_iter()
            .filter(|p| p.seller_id() == Some(seller_id))
            .collect()
    }

    /// Every product in any state, in submission order.
    pub fn list_all(&self) -> Vec<Product> {
        self.products.view().list()
    }

    pub fn moderation_summary(&self) -> ModerationSummary {
        self.products
            .view()
            .list()
            .iter()
            .fold(ModerationSummary::default(), |mut acc, p| {
                match p.moderation_state() {
                    ModerationState::Pending => acc.pending += 1,
                    ModerationState::Approved => acc.approved += 1,
                    ModerationState::Rejected => acc.rejected += 1,
                }
                acc.total += 1;
                acc
            })
    }

    /// Audit trail: every event recorded for the product, in order.
    pub fn history(&self, product_id: ProductId) -> Result<Vec<EventEnvelope<ProductEvent>>, DispatchError> {
        let (_, stream) = self.products.load(product_id)?;
        if stream.is_empty() {
            return Err(DomainError::not_found("product", product_id).into());
        }
        stream
            .iter()
            .map(|stored| {
                stored
                    .to_typed_envelope()
                    .map_err(|e| DispatchError::Deserialize(e.to_string()))
            })
            .collect()
    }
}
