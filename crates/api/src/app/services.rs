//! Infrastructure wiring behind the HTTP layer.

use std::sync::Arc;

use tracing::info;

use kivu_infra::Marketplace;

/// Marketplace services over an in-memory event store.
///
/// State lives for the lifetime of the process.
pub fn build_services(default_locale: &str) -> Arc<Marketplace> {
    info!(default_locale, "marketplace services ready (in-memory event store)");
    Arc::new(Marketplace::in_memory(default_locale))
}
