use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use kivu_core::{DomainError, UserId};
use kivu_orders::{Cart, PurchaseIntent, Receipt, quote};
use kivu_products::{ProductId, PurchaseType};

use super::{OrderIntake, ProductStreams};
use crate::command_dispatcher::DispatchError;

type CartSlot = Arc<Mutex<Cart>>;

/// Per-buyer carts and checkout.
///
/// Each cart has its own lock, so one buyer's checkout never waits on another's.
/// Carts are working state, not records: they live only in memory.
#[derive(Debug, Clone)]
pub struct Carts {
    products: Arc<ProductStreams>,
    order_intake: OrderIntake,
    carts: Arc<Mutex<HashMap<UserId, CartSlot>>>,
}

impl Carts {
    pub fn new(products: Arc<ProductStreams>, order_intake: OrderIntake) -> Self {
        Self {
            products,
            order_intake,
            carts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The buyer's cart; empty when nothing was ever added.
    pub fn view(&self, buyer_id: UserId) -> Cart {
        let slot = self.slot(buyer_id);
        let cart = slot.lock().unwrap_or_else(PoisonError::into_inner);
        cart.clone()
    }

    /// Add units of an approved product to the buyer's cart.
    pub fn add(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
        purchase_type: PurchaseType,
        quantity: u32,
    ) -> Result<Cart, DispatchError> {
        let product = self.products.current(product_id)?;
        quote(
            &product,
            &PurchaseIntent {
                product_id,
                quantity,
                purchase_type,
                buyer_id,
            },
        )?;

        let slot = self.slot(buyer_id);
        let mut cart = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let line = cart.add(product_id, purchase_type, quantity, Utc::now())?;
        info!(
            buyer_id = %buyer_id,
            product_id = %product_id,
            purchase_type = purchase_type.as_str(),
            quantity = line.quantity,
            "cart line updated"
        );
        Ok(cart.clone())
    }

    pub fn remove(&self, buyer_id: UserId, product_id: ProductId) -> Cart {
        let slot = self.slot(buyer_id);
        let mut cart = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = cart.remove(product_id, Utc::now());
        info!(buyer_id = %buyer_id, product_id = %product_id, removed, "cart lines removed");
        cart.clone()
    }

    pub fn clear(&self, buyer_id: UserId) -> Cart {
        let slot = self.slot(buyer_id);
        let mut cart = slot.lock().unwrap_or_else(PoisonError::into_inner);
        cart.clear(Utc::now());
        cart.clone()
    }

    /// Turn every cart line into a purchase, in line order, and empty the cart.
    ///
    /// Every line is priced before any is fulfilled, so a line that cannot be
    /// bought fails the checkout with no receipt issued and no pool advanced.
    /// If fulfilment itself fails part way, the lines already fulfilled leave
    /// the cart (their receipts stand) and the rest stay for a retry.
    pub fn checkout(&self, buyer_id: UserId) -> Result<Vec<Receipt>, DispatchError> {
        let slot = self.slot(buyer_id);
        let mut cart = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if cart.is_empty() {
            return Err(DomainError::validation("cart", "is empty").into());
        }

        let intents = cart.intents();
        for intent in &intents {
            let product = self.products.current(intent.product_id)?;
            quote(&product, intent)?;
        }

        let mut receipts = Vec::with_capacity(intents.len());
        for intent in &intents {
            match self.order_intake.submit_purchase_intent(intent) {
                Ok(receipt) => receipts.push(receipt),
                Err(err) => {
                    cart.drain_fulfilled(receipts.len(), Utc::now());
                    warn!(
                        buyer_id = %buyer_id,
                        fulfilled = receipts.len(),
                        remaining = cart.lines().len(),
                        error = %err,
                        "checkout stopped part way"
                    );
                    return Err(err);
                }
            }
        }

        cart.clear(Utc::now());
        info!(buyer_id = %buyer_id, receipts = receipts.len(), "cart checked out");
        Ok(receipts)
    }

    fn slot(&self, buyer_id: UserId) -> CartSlot {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        carts
            .entry(buyer_id)
            .or_insert_with(|| Arc::new(Mutex::new(Cart::new(buyer_id))))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use kivu_auth::{ModeratorCapability, Principal, PrincipalId, Role};
    use kivu_core::{AggregateId, Money};
    use kivu_products::{DEFAULT_LOCALE, Product, ProductDraft};

    use super::*;
    use crate::services::Marketplace;

    fn product(m: &Marketplace, name: &str, approve: bool) -> Product {
        let p = m
            .catalog()
            .submit(
                UserId::new(),
                ProductDraft {
                    name: name.to_string(),
                    description: format!("{name} description"),
                    category: "Farm".to_string(),
                    image: Some(format!("{name}.jpg")),
                    regular_price: 20.0,
                    per_item_price: 18.0,
                    pool_price: 15.0,
                    pool_size: 10,
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
    fn adding_twice_merges_the_line() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let seeds = product(&m, "Maize Seed", true).id_typed();
        let buyer = UserId::new();

        m.carts().add(buyer, seeds, PurchaseType::Pool, 2).unwrap();
        let cart = m.carts().add(buyer, seeds, PurchaseType::Pool, 1).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(m.carts().view(buyer), cart);
        assert!(m.carts().view(UserId::new()).is_empty());
    }

    #[test]
    fn only_approved_products_can_be_added() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let pending = product(&m, "Hoe", false).id_typed();
        let buyer = UserId::new();

        let err = m.carts().add(buyer, pending, PurchaseType::Individual, 1).unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::InvalidState { .. })));

        let err = m
            .carts()
            .add(buyer, ProductId::new(AggregateId::new()), PurchaseType::Individual, 1)
            .unwrap_err();
        assert!(matches!(err, DispatchError::Domain(DomainError::NotFound { .. })));
        assert!(m.carts().view(buyer).is_empty());
    }

    #[test]
    fn checkout_issues_receipts_and_empties_the_cart() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let seeds = product(&m, "Maize Seed", true).id_typed();
        let feed = product(&m, "Chicken Feed", true).id_typed();
        let buyer = UserId::new();
        m.carts().add(buyer, seeds, PurchaseType::Pool, 4).unwrap();
        m.carts().add(buyer, feed, PurchaseType::Individual, 2).unwrap();

        let receipts = m.carts().checkout(buyer).unwrap();

        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].line_total, Money::from_cents(6000));
        assert_eq!(receipts[0].pool_current, 4);
        assert_eq!(receipts[1].line_total, Money::from_cents(3600));
        assert_eq!(m.catalog().get_by_id(seeds).unwrap().pool_current(), 4);
        assert_eq!(m.catalog().get_by_id(feed).unwrap().pool_current(), 0);
        assert!(m.carts().view(buyer).is_empty());
        assert_eq!(m.order_intake().receipts_for(buyer), receipts);
    }

    #[test]
    fn empty_cart_cannot_be_checked_out() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let err = m.carts().checkout(UserId::new()).unwrap_err();
        assert_eq!(
            match err {
                DispatchError::Domain(e) => e.violations()[0].field.clone(),
                other => panic!("unexpected {other:?}"),
            },
            "cart"
        );
    }

    #[test]
    fn remove_and_clear_only_touch_the_buyers_cart() {
        let m = Marketplace::in_memory(DEFAULT_LOCALE);
        let seeds = product(&m, "Maize Seed", true).id_typed();
        let feed = product(&m, "Chicken Feed", true).id_typed();
        let alice = UserId::new();
        let bob = UserId::new();
        m.carts().add(alice, seeds, PurchaseType::Pool, 1).unwrap();
        m.carts().add(alice, seeds, PurchaseType::Individual, 1).unwrap();
        m.carts().add(alice, feed, PurchaseType::Pool, 1).unwrap();
        m.carts().add(bob, seeds, PurchaseType::Pool, 1).unwrap();

        let cart = m.carts().remove(alice, seeds);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, feed);

        assert!(m.carts().clear(alice).is_empty());
        assert_eq!(m.carts().view(bob).lines().len(), 1);
    }
}
