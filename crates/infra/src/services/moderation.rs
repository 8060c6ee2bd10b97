use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use kivu_auth::ModeratorCapability;
use kivu_products::{ApproveProduct, Product, ProductCommand, ProductId, RejectProduct};

use super::ProductStreams;
use crate::command_dispatcher::DispatchError;

/// Explicit, privileged moderation actions: `pending` → `approved` | `rejected`.
///
/// Who may moderate is decided by whoever issues the [`ModeratorCapability`];
/// this service only requires one.
#[derive(Debug, Clone)]
pub struct ModerationWorkflow {
    products: Arc<ProductStreams>,
}

impl ModerationWorkflow {
    pub fn new(products: Arc<ProductStreams>) -> Self {
        Self { products }
    }

    pub fn approve(&self, capability: &ModeratorCapability, product_id: ProductId) -> Result<Product, DispatchError> {
        let command = ProductCommand::ApproveProduct(ApproveProduct {
            product_id,
            occurred_at: Utc::now(),
        });
        let product = self.products.execute(&command)?;
        info!(
            product_id = %product_id,
            moderator = %capability.moderator(),
            "product approved"
        );
        Ok(product)
    }

    pub fn reject(
        &self,
        capability: &ModeratorCapability,
        product_id: ProductId,
        reason: Option<String>,
    ) -> Result<Product, DispatchError> {
        let command = ProductCommand::RejectProduct(RejectProduct {
            product_id,
            reason,
            occurred_at: Utc::now(),
        });
        let product = self.products.execute(&command)?;
        info!(
            product_id = %product_id,
            moderator = %capability.moderator(),
            reason = product.rejection_reason().unwrap_or(""),
            "product rejected"
        );
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use kivu_auth::{Principal, PrincipalId, Role};
    use kivu_core::{AggregateId, DomainError, UserId};
    use kivu_products::{DEFAULT_LOCALE, ModerationState, ProductDraft, ProductFilter};

    use super::*;
    use crate::services::Marketplace;

    fn moderator() -> ModeratorCapability {
        let admin = Principal::from_roles(PrincipalId::new(), vec![Role::ADMIN]);
        ModeratorCapability::grant(&admin).unwrap()
    }

    fn submit(m: &Marketplace) -> Product {
        m.catalog()
            .submit(
                UserId::new(),
                ProductDraft {
                    name: "Water Filter".to_string(),
                    description: "Ceramic".to_string(),
                    category: "Home".to_string(),
                    image: Some("filter.jpg".to_string()),
                    regular_price: 60.0,
                    per_item_price: 55.0,
                    pool_price: 45.0,
                    pool_size: 20,
                    ..ProductDraft::default()
                },
            )
            .unwrap()
    }

    fn invalid_state(err: DispatchError) -> bool {
        matches!(err, DispatchError::Domain(DomainError::InvalidState { .. }))
    }

    #[test]
    fn approve_makes_product_public() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let p = submit(&m);

        let approved = m.moderation().approve(&moderator(), p.id_typed()).unwrap();
        assert_eq!(approved.moderation_state(), ModerationState::Approved);
        assert!(approved.moderated_at().is_some());
        assert_eq!(m.catalog().list_approved(&ProductFilter::default()).len(), 1);
        assert!(m.catalog().list_pending().is_empty());
    }

    #[test]
    fn approve_twice_fails_and_state_stays_approved() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let cap = moderator();
        let p = submit(&m);

        m.moderation().approve(&cap, p.id_typed()).unwrap();
        assert!(invalid_state(m.moderation().approve(&cap, p.id_typed()).unwrap_err()));
        assert!(invalid_state(m.moderation().reject(&cap, p.id_typed(), None).unwrap_err()));
        assert_eq!(
            m.catalog().get_by_id(p.id_typed()).unwrap().moderation_state(),
            ModerationState::Approved
        );
    }

    #[test]
    fn rejection_is_terminal_and_audited() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let cap = moderator();
        let p = submit(&m);

        let rejected = m
            .moderation()
            .reject(&cap, p.id_typed(), Some("counterfeit".to_string()))
            .unwrap();
        assert_eq!(rejected.rejection_reason(), Some("counterfeit"));
        assert!(invalid_state(m.moderation().approve(&cap, p.id_typed()).unwrap_err()));

        assert!(m.catalog().list_approved(&ProductFilter::default()).is_empty());
        assert_eq!(m.catalog().list_all().len(), 1);
        assert_eq!(m.catalog().history(p.id_typed()).unwrap().len(), 2);
    }

    #[test]
    fn moderating_unknown_product_is_not_found() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let err = m
            .moderation()
            .approve(&moderator(), ProductId::new(AggregateId::new()))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::NotFound { .. })));
    }

    #[test]
    fn concurrent_approvals_succeed_exactly_once() {
        let m = Arc::new(Marketplace::in_memory(DEFAULT_LOCALE));
        let p = submit(&m);
        let threads = 6;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let m = m.clone();
                let barrier = barrier.clone();
                let id = p.id_typed();
                std::thread::spawn(move || {
                    let cap = moderator();
                    barrier.wait();
                    m.moderation().approve(&cap, id).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(m.catalog().history(p.id_typed()).unwrap().len(), 2);
    }
}
