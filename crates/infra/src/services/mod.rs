//! Application services: the marketplace operations, composed over the
//! command pipeline, the catalog view, the receipt book and buyer carts.

pub mod cart;
pub mod catalog;
pub mod moderation;
pub mod order_intake;
pub mod pool_ledger;

use std::sync::Arc;

use kivu_products::{Product, ProductCommand, ProductId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, InMemoryEventStore, StoredEvent};
use crate::projections::ProductCatalogProjection;
use crate::read_model::{InMemoryReadStore, ReceiptBook};

pub use cart::Carts;
pub use catalog::{Catalog, ModerationSummary};
pub use moderation::ModerationWorkflow;
pub use order_intake::OrderIntake;
pub use pool_ledger::PoolLedger;

/// Stream type name for product aggregates.
pub const PRODUCT_AGGREGATE_TYPE: &str = "products.product";

pub type ProductView = ProductCatalogProjection<InMemoryReadStore<ProductId, Product>>;

/// Write path shared by every service that mutates products.
#[derive(Debug)]
pub struct ProductStreams {
    dispatcher: CommandDispatcher<Arc<dyn EventStore>>,
    view: ProductView,
}

impl ProductStreams {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
            view: ProductCatalogProjection::new(InMemoryReadStore::new()),
        }
    }

    /// Run a command to completion and publish the new snapshot to the view.
    ///
    /// Starts from the view's snapshot, so only events committed after it are
    /// read back from the store.
    pub fn execute(&self, command: &ProductCommand) -> Result<Product, DispatchError> {
        let product_id = command.product_id();
        let dispatched = self.dispatcher.dispatch_from(
            product_id.0,
            PRODUCT_AGGREGATE_TYPE,
            command,
            self.view.get(&product_id),
            empty_product,
        )?;
        self.view.record(&dispatched.aggregate);
        Ok(dispatched.aggregate)
    }

    /// Head-of-stream state: the view's snapshot plus any events it has not seen.
    pub fn current(&self, product_id: ProductId) -> Result<Product, DispatchError> {
        let mut product = self
            .view
            .get(&product_id)
            .unwrap_or_else(|| empty_product(product_id.0));
        if self.dispatcher.catch_up(product_id.0, &mut product)? > 0 {
            self.view.record(&product);
        }
        Ok(product)
    }

    /// Authoritative state and full history, rehydrated from the event store.
    pub fn load(&self, product_id: ProductId) -> Result<(Product, Vec<StoredEvent>), DispatchError> {
        self.dispatcher.load(product_id.0, empty_product)
    }

    pub fn view(&self) -> &ProductView {
        &self.view
    }
}

fn empty_product(id: kivu_core::AggregateId) -> Product {
    Product::empty(ProductId::new(id))
}

/// Composition root for the marketplace core.
#[derive(Debug, Clone)]
pub struct Marketplace {
    catalog: Catalog,
    moderation: ModerationWorkflow,
    pool_ledger: PoolLedger,
    order_intake: OrderIntake,
    carts: Carts,
}

impl Marketplace {
    pub fn new(store: Arc<dyn EventStore>, default_locale: impl Into<String>) -> Self {
        let products = Arc::new(ProductStreams::new(store));
        let receipts = Arc::new(ReceiptBook::new());
        let pool_ledger = PoolLedger::new(products.clone());
        let order_intake = OrderIntake::new(products.clone(), pool_ledger.clone(), receipts);

        Self {
            catalog: Catalog::new(products.clone(), default_locale),
            moderation: ModerationWorkflow::new(products.clone()),
            carts: Carts::new(products, order_intake.clone()),
            order_intake,
            pool_ledger,
        }
    }

    /// Marketplace backed by an in-memory event store.
    pub fn in_memory(default_locale: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemoryEventStore::new()), default_locale)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn moderation(&self) -> &ModerationWorkflow {
        &self.moderation
    }

    pub fn pool_ledger(&self) -> &PoolLedger {
        &self.pool_ledger
    }

    pub fn order_intake(&self) -> &OrderIntake {
        &self.order_intake
    }

    pub fn carts(&self) -> &Carts {
        &self.carts
    }
}
