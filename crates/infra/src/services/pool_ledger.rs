use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use kivu_products::{CommitToPool, PoolCommitment, ProductCommand, ProductId};

use super::ProductStreams;
use crate::command_dispatcher::DispatchError;

/// The only writer of a product's pool counter.
///
/// Commitments for the same product are serialized through the event stream's
/// optimistic concurrency check; conflicting writers retry against the fresh
/// counter, so concurrent commitments all land.
#[derive(Debug, Clone)]
pub struct PoolLedger {
    products: Arc<ProductStreams>,
}

impl PoolLedger {
    pub fn new(products: Arc<ProductStreams>) -> Self {
        Self { products }
    }

    pub fn commit_to_pool(&self, product_id: ProductId, quantity: u32) -> Result<PoolCommitment, DispatchError> {
        let command = ProductCommand::CommitToPool(CommitToPool {
            product_id,
            quantity,
            occurred_at: Utc::now(),
        });
        let product = self.products.execute(&command)?;
        let commitment = product.pool_commitment();

        info!(
            product_id = %product_id,
            quantity,
            pool_current = commitment.new_pool_current,
            pool_size = product.pool_size(),
            "pool commitment recorded"
        );
        if commitment.pool_completed && commitment.new_pool_current - quantity < product.pool_size() {
            info!(product_id = %product_id, pool_size = product.pool_size(), "pool target reached");
        }

        Ok(commitment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use kivu_auth::{ModeratorCapability, Principal, PrincipalId, Role};
    use kivu_core::{AggregateId, DomainError, UserId};
    use kivu_products::{DEFAULT_LOCALE, Product, ProductDraft};

    use super::*;
    use crate::services::Marketplace;

    fn product(m: &Marketplace, pool_size: i64, pool_current: i64, approve: bool) -> Product {
        let p = m
            .catalog()
            .submit(
                UserId::new(),
                ProductDraft {
                    name: "Cooking Gas Refill".to_string(),
                    description: "13kg".to_string(),
                    category: "Energy".to_string(),
                    image: Some("gas.jpg".to_string()),
                    regular_price: 35.0,
                    per_item_price: 32.0,
                    pool_price: 28.0,
                    pool_size,
                    pool_current: Some(pool_current),
                    ..ProductDraft::default()
                },
            )
            .unwrap();
        if approve {
            let admin = Principal::from_roles(PrincipalId::new(), vec![Role::ADMIN]);
            let cap = ModeratorCapability::grant(&admin).unwrap();
            m.moderation().approve(&cap, p.id_typed()).unwrap();
        }
        p
    }

    #[test]
    fn last_unit_completes_the_pool() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let p = product(&m, 10, 9, true);

        let c = m.pool_ledger().commit_to_pool(p.id_typed(), 1).unwrap();
        assert_eq!(
            c,
            PoolCommitment {
                new_pool_current: 10,
                pool_completed: true
            }
        );
    }

    #[test]
    fn commitments_past_the_target_are_kept() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let p = product(&m, 3, 0, true);

        assert!(!m.pool_ledger().commit_to_pool(p.id_typed(), 2).unwrap().pool_completed);
        let c = m.pool_ledger().commit_to_pool(p.id_typed(), 5).unwrap();
        assert_eq!(c.new_pool_current, 7);
        assert!(c.pool_completed);
        assert_eq!(m.catalog().get_by_id(p.id_typed()).unwrap().pool_current(), 7);
    }

    #[test]
    fn precondition_failures_leave_the_counter_alone() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let pending = product(&m, 10, 0, false);
        let err = m.pool_ledger().commit_to_pool(pending.id_typed(), 1).unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::InvalidState { .. })));

        let approved = product(&m, 10, 0, true);
        let err = m.pool_ledger().commit_to_pool(approved.id_typed(), 0).unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::Validation(_))));

        let err = m
            .pool_ledger()
            .commit_to_pool(ProductId::new(AggregateId::new()), 1)
            .unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::NotFound { .. })));

        assert_eq!(m.catalog().get_by_id(pending.id_typed()).unwrap().pool_current(), 0);
        assert_eq!(m.catalog().get_by_id(approved.id_typed()).unwrap().pool_current(), 0);
    }

    #[test]
    fn two_concurrent_commits_both_land() {
        let m = Arc::new(Marketplace::in_memory(DEFAULT_LOCALE));
        let p = product(&m, 10, 0, true);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let m = m.clone();
                let barrier = barrier.clone();
                let id = p.id_typed();
                std::thread::spawn(move || {
                    barrier.wait();
                    m.pool_ledger().commit_to_pool(id, 1).unwrap()
                })
            })
            .collect();
        let mut seen: Vec<u32> = handles
            .into_iter()
            .map(|h| h.join().unwrap().new_pool_current)
            .collect();
        seen.sort_unstable();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(m.catalog().get_by_id(p.id_typed()).unwrap().pool_current(), 2);
    }

    #[test]
    fn many_concurrent_commits_across_products() {
        let m = Arc::new(Marketplace::in_memory(DEFAULT_LOCALE));
        let a = product(&m, 100, 0, true).id_typed();
        let b = product(&m, 100, 0, true).id_typed();
        let threads = 8;
        let per_thread = 20;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let m = m.clone();
                let barrier = barrier.clone();
                let target = if i % 2 == 0 { a } else { b };
                std::thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..per_thread {
                        m.pool_ledger().commit_to_pool(target, 1).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let expected = (threads / 2 * per_thread) as u32;
        assert_eq!(m.catalog().get_by_id(a).unwrap().pool_current(), expected);
        assert_eq!(m.catalog().get_by_id(b).unwrap().pool_current(), expected);
    }
}
