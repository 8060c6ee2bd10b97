use kivu_core::AggregateRoot;
use kivu_products::{Product, ProductId};

use crate::read_model::ReadStore;

/// Queryable product snapshots (catalog view).
///
/// Holds every product regardless of moderation state. Snapshots are recorded
/// by the write path right after their events are committed; an older snapshot
/// never overwrites a newer one, whatever order concurrent writers finish in.
#[derive(Debug)]
pub struct ProductCatalogProjection<S>
where
    S: ReadStore<ProductId, Product>,
{
    store: S,
}

impl<S> ProductCatalogProjection<S>
where
    S: ReadStore<ProductId, Product>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a committed snapshot. Returns `false` when a newer one is already held.
    pub fn record(&self, product: &Product) -> bool {
        if !product.is_created() {
            return false;
        }
        self.store
            .upsert_if(product.id_typed(), product.clone(), |existing, incoming| {
                incoming.version() > existing.version()
            })
    }

    pub fn get(&self, product_id: &ProductId) -> Option<Product> {
        self.store.get(product_id)
    }

    /// Every product, in submission order.
    pub fn list(&self) -> Vec<Product> {
        self.store.list()
    }
}
