use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kivu_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, UserId};
use kivu_events::Event;

use crate::draft::{ProductDetails, ProductDraft};
use crate::pricing;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Moderation lifecycle: `pending` → `approved` | `rejected`.
///
/// Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    Pending,
    Approved,
    Rejected,
}

impl ModerationState {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationState::Pending => "pending",
            ModerationState::Approved => "approved",
            ModerationState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ModerationState::Pending)
    }
}

impl core::fmt::Display for ModerationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of committing units to a product's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCommitment {
    pub new_pool_current: u32,
    pub pool_completed: bool,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    seller_id: Option<UserId>,
    details: ProductDetails,
    pool_current: u32,
    moderation_state: ModerationState,
    rejection_reason: Option<String>,
    moderated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-submitted aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            seller_id: None,
            details: ProductDetails::default(),
            pool_current: 0,
            moderation_state: ModerationState::Pending,
            rejection_reason: None,
            moderated_at: None,
            created_at: DateTime::<Utc>::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn seller_id(&self) -> Option<UserId> {
        self.seller_id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn name_localized(&self) -> &BTreeMap<String, String> {
        &self.details.name_localized
    }

    pub fn description(&self) -> &str {
        &self.details.description
    }

    pub fn description_localized(&self) -> &BTreeMap<String, String> {
        &self.details.description_localized
    }

    pub fn category(&self) -> &str {
        &self.details.category
    }

    pub fn images(&self) -> &[String] {
        &self.details.images
    }

    /// First image of the sequence.
    pub fn main_image(&self) -> Option<&str> {
        self.details.images.first().map(String::as_str)
    }

    pub fn regular_price(&self) -> Money {
        self.details.regular_price
    }

    pub fn per_item_price(&self) -> Money {
        self.details.per_item_price
    }

    pub fn pool_price(&self) -> Money {
        self.details.pool_price
    }

    pub fn pool_size(&self) -> u32 {
        self.details.pool_size
    }

    pub fn pool_current(&self) -> u32 {
        self.pool_current
    }

    pub fn rating(&self) -> f64 {
        self.details.rating
    }

    pub fn moderation_state(&self) -> ModerationState {
        self.moderation_state
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn moderated_at(&self) -> Option<DateTime<Utc>> {
        self.moderated_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Approved products are the only ones visible to buyers and listings.
    pub fn is_approved(&self) -> bool {
        self.created && self.moderation_state == ModerationState::Approved
    }

    pub fn is_pool_complete(&self) -> bool {
        pricing::is_pool_complete(self.pool_current, self.details.pool_size)
    }

    pub fn discount_percent(&self) -> u32 {
        pricing::discount_percent(self.details.regular_price, self.details.pool_price)
    }

    pub fn pool_completion_ratio(&self) -> f64 {
        pricing::pool_completion_ratio(self.pool_current, self.details.pool_size)
    }

    pub fn pool_commitment(&self) -> PoolCommitment {
        PoolCommitment {
            new_pool_current: self.pool_current,
            pool_completed: self.is_pool_complete(),
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitProduct (seller submission, lands in `pending`).
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitProduct {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub draft: ProductDraft,
    /// Locale whose localized text stands in for a blank name/description.
    pub default_locale: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveProduct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectProduct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectProduct {
    pub product_id: ProductId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CommitToPool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitToPool {
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductCommand {
    SubmitProduct(SubmitProduct),
    ApproveProduct(ApproveProduct),
    RejectProduct(RejectProduct),
    CommitToPool(CommitToPool),
}

impl ProductCommand {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductCommand::SubmitProduct(c) => c.product_id,
            ProductCommand::ApproveProduct(c) => c.product_id,
            ProductCommand::RejectProduct(c) => c.product_id,
            ProductCommand::CommitToPool(c) => c.product_id,
        }
    }
}

/// Event: ProductSubmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSubmitted {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub details: ProductDetails,
    pub pool_current: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductApproved {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRejected {
    pub product_id: ProductId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PoolCommitted.
///
/// `pool_current` is the counter value after the commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCommitted {
    pub product_id: ProductId,
    pub quantity: u32,
    pub pool_current: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductSubmitted(ProductSubmitted),
    ProductApproved(ProductApproved),
    ProductRejected(ProductRejected),
    PoolCommitted(PoolCommitted),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductSubmitted(_) => "products.product.submitted",
            ProductEvent::ProductApproved(_) => "products.product.approved",
            ProductEvent::ProductRejected(_) => "products.product.rejected",
            ProductEvent::PoolCommitted(_) => "products.pool.committed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductSubmitted(e) => e.occurred_at,
            ProductEvent::ProductApproved(e) => e.occurred_at,
            ProductEvent::ProductRejected(e) => e.occurred_at,
            ProductEvent::PoolCommitted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductSubmitted(e) => {
                self.id = e.product_id;
                self.seller_id = Some(e.seller_id);
                self.details = e.details.clone();
                self.pool_current = e.pool_current;
                self.moderation_state = ModerationState::Pending;
                self.created_at = e.occurred_at;
                self.created = true;
            }
            ProductEvent::ProductApproved(e) => {
                self.moderation_state = ModerationState::Approved;
                self.moderated_at = Some(e.occurred_at);
            }
            ProductEvent::ProductRejected(e) => {
                self.moderation_state = ModerationState::Rejected;
                self.rejection_reason = e.reason.clone();
                self.moderated_at = Some(e.occurred_at);
            }
            ProductEvent::PoolCommitted(e) => {
                self.pool_current = e.pool_current;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::SubmitProduct(cmd) => self.handle_submit(cmd),
            ProductCommand::ApproveProduct(cmd) => self.handle_approve(cmd),
            ProductCommand::RejectProduct(cmd) => self.handle_reject(cmd),
            ProductCommand::CommitToPool(cmd) => self.handle_commit(cmd),
        }
    }
}

impl Product {
    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("product", self.id));
        }
        Ok(())
    }

    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invalid_id(format!(
                "command targets product {product_id}, aggregate is {}",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<(), DomainError> {
        if self.moderation_state.is_terminal() {
            return Err(DomainError::invalid_state(
                "product",
                self.id,
                format!("cannot {action} a product that is already {}", self.moderation_state),
            ));
        }
        Ok(())
    }

    fn handle_submit(&self, cmd: &SubmitProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!("product {} already exists", cmd.product_id)));
        }
        self.ensure_product_id(cmd.product_id)?;

        let validated = cmd.draft.validate(&cmd.default_locale)?;

        Ok(vec![ProductEvent::ProductSubmitted(ProductSubmitted {
            product_id: cmd.product_id,
            seller_id: cmd.seller_id,
            details: validated.details,
            pool_current: validated.pool_current,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_product_id(cmd.product_id)?;
        self.ensure_pending("approve")?;

        Ok(vec![ProductEvent::ProductApproved(ProductApproved {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_product_id(cmd.product_id)?;
        self.ensure_pending("reject")?;

        let reason = cmd
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(vec![ProductEvent::ProductRejected(ProductRejected {
            product_id: cmd.product_id,
            reason,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_commit(&self, cmd: &CommitToPool) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_product_id(cmd.product_id)?;

        if self.moderation_state != ModerationState::Approved {
            return Err(DomainError::invalid_state(
                "product",
                self.id,
                format!(
                    "only approved products accept pool commitments (state: {})",
                    self.moderation_state
                ),
            ));
        }

        if cmd.quantity < 1 {
            return Err(DomainError::validation("quantity", "must be at least 1"));
        }

        let pool_current = self
            .pool_current
            .checked_add(cmd.quantity)
            .ok_or_else(|| DomainError::validation("quantity", "exceeds the pool counter range"))?;

        Ok(vec![ProductEvent::PoolCommitted(PoolCommitted {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            pool_current,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DEFAULT_LOCALE;

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_draft() -> ProductDraft {
        ProductDraft {
            name: "Solar Lantern".to_string(),
            description: "Charges in four hours".to_string(),
            category: "Home".to_string(),
            image: Some("lantern.jpg".to_string()),
            regular_price: 120.0,
            per_item_price: 99.99,
            pool_price: 79.99,
            pool_size: 10,
            ..ProductDraft::default()
        }
    }

    fn submit_cmd(product_id: ProductId, draft: ProductDraft) -> ProductCommand {
        ProductCommand::SubmitProduct(SubmitProduct {
            product_id,
            seller_id: UserId::new(),
            draft,
            default_locale: DEFAULT_LOCALE.to_string(),
            occurred_at: test_time(),
        })
    }

    fn approve_cmd(product_id: ProductId) -> ProductCommand {
        ProductCommand::ApproveProduct(ApproveProduct {
            product_id,
            occurred_at: test_time(),
        })
    }

    fn reject_cmd(product_id: ProductId, reason: Option<&str>) -> ProductCommand {
        ProductCommand::RejectProduct(RejectProduct {
            product_id,
            reason: reason.map(str::to_string),
            occurred_at: test_time(),
        })
    }

    fn commit_cmd(product_id: ProductId, quantity: u32) -> ProductCommand {
        ProductCommand::CommitToPool(CommitToPool {
            product_id,
            quantity,
            occurred_at: test_time(),
        })
    }

    fn execute(product: &mut Product, cmd: ProductCommand) -> Result<(), DomainError> {
        for event in product.handle(&cmd)? {
            product.apply(&event);
        }
        Ok(())
    }

    fn submitted(draft: ProductDraft) -> Product {
        let product_id = test_product_id();
        let mut product = Product::empty(product_id);
        execute(&mut product, submit_cmd(product_id, draft)).unwrap();
        product
    }

    fn approved() -> Product {
        let mut product = submitted(test_draft());
        { let cmd = approve_cmd(product.id_typed()); execute(&mut product, cmd) }.unwrap();
        product
    }

    #[test]
    fn submit_emits_product_submitted_in_pending_state() {
        let product_id = test_product_id();
        let product = Product::empty(product_id);

        let events = product.handle(&submit_cmd(product_id, test_draft())).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ProductEvent::ProductSubmitted(e) => {
                assert_eq!(e.product_id, product_id);
                assert_eq!(e.details.name, "Solar Lantern");
                assert_eq!(e.pool_current, 0);
            }
            _ => panic!("Expected ProductSubmitted event"),
        }

        let product = submitted(test_draft());
        assert_eq!(product.moderation_state(), ModerationState::Pending);
        assert!(!product.is_approved());
        assert_eq!(product.main_image(), Some("lantern.jpg"));
    }

    #[test]
    fn submit_rejects_price_ordering_violations() {
        let product_id = test_product_id();
        let product = Product::empty(product_id);
        let mut draft = test_draft();
        draft.pool_price = 150.0;

        let err = product.handle(&submit_cmd(product_id, draft)).unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v[0].field, "poolPrice"),
            _ => panic!("Expected Validation error for pool price above per-item price"),
        }
    }

    #[test]
    fn submit_rejects_duplicate_creation() {
        let mut product = submitted(test_draft());
        let err = { let cmd = submit_cmd(product.id_typed(), test_draft()); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn approve_moves_pending_to_approved() {
        let product = approved();
        assert_eq!(product.moderation_state(), ModerationState::Approved);
        assert!(product.is_approved());
        assert!(product.moderated_at().is_some());
    }

    #[test]
    fn approve_twice_fails_with_invalid_state() {
        let mut product = approved();
        let err = { let cmd = approve_cmd(product.id_typed()); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert_eq!(product.moderation_state(), ModerationState::Approved);
    }

    #[test]
    fn reject_is_terminal_and_keeps_reason() {
        let mut product = submitted(test_draft());
        { let cmd = reject_cmd(product.id_typed(), Some("  blurry photos ")); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.moderation_state(), ModerationState::Rejected);
        assert_eq!(product.rejection_reason(), Some("blurry photos"));

        let err = { let cmd = approve_cmd(product.id_typed()); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        let err = { let cmd = reject_cmd(product.id_typed(), None); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
    }

    #[test]
    fn blank_rejection_reason_is_dropped() {
        let mut product = submitted(test_draft());
        { let cmd = reject_cmd(product.id_typed(), Some("   ")); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.rejection_reason(), None);
    }

    #[test]
    fn approved_product_cannot_be_rejected() {
        let mut product = approved();
        let err = { let cmd = reject_cmd(product.id_typed(), Some("late")); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
    }

    #[test]
    fn moderation_of_missing_product_is_not_found() {
        let product = Product::empty(test_product_id());
        let err = product.handle(&approve_cmd(product.id_typed())).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "product", .. }));
    }

    #[test]
    fn commit_requires_approval() {
        let mut product = submitted(test_draft());
        let err = { let cmd = commit_cmd(product.id_typed(), 1); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));
        assert_eq!(product.pool_current(), 0);
    }

    #[test]
    fn commit_rejects_zero_quantity() {
        let mut product = approved();
        let err = { let cmd = commit_cmd(product.id_typed(), 0); execute(&mut product, cmd) }.unwrap_err();
        assert_eq!(err.violations()[0].field, "quantity");
    }

    #[test]
    fn commit_advances_counter_and_reports_completion() {
        let mut draft = test_draft();
        draft.pool_current = Some(9);
        let mut product = submitted(draft);
        { let cmd = approve_cmd(product.id_typed()); execute(&mut product, cmd) }.unwrap();

        { let cmd = commit_cmd(product.id_typed(), 1); execute(&mut product, cmd) }.unwrap();
        assert_eq!(
            product.pool_commitment(),
            PoolCommitment {
                new_pool_current: 10,
                pool_completed: true
            }
        );

        // The counter is not capped at the pool size.
        { let cmd = commit_cmd(product.id_typed(), 5); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.pool_current(), 15);
        assert_eq!(product.pool_completion_ratio(), 1.0);
    }

    #[test]
    fn commit_overflow_is_a_validation_error() {
        let mut product = approved();
        { let cmd = commit_cmd(product.id_typed(), u32::MAX); execute(&mut product, cmd) }.unwrap();
        let err = { let cmd = commit_cmd(product.id_typed(), 1); execute(&mut product, cmd) }.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn command_for_another_product_is_refused() {
        let product = approved();
        let err = product.handle(&commit_cmd(test_product_id(), 1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn version_increments_on_apply() {
        let mut product = Product::empty(test_product_id());
        assert_eq!(product.version(), 0);
        { let cmd = submit_cmd(product.id_typed(), test_draft()); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.version(), 1);
        { let cmd = approve_cmd(product.id_typed()); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.version(), 2);
        { let cmd = commit_cmd(product.id_typed(), 2); execute(&mut product, cmd) }.unwrap();
        assert_eq!(product.version(), 3);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let product = approved();
        let before = product.clone();

        let events1 = product.handle(&commit_cmd(product.id_typed(), 1)).unwrap();
        let events2 = product.handle(&commit_cmd(product.id_typed(), 1)).unwrap();

        assert_eq!(product, before);
        match (&events1[0], &events2[0]) {
            (ProductEvent::PoolCommitted(a), ProductEvent::PoolCommitted(b)) => {
                assert_eq!(a.pool_current, 1);
                assert_eq!(b.pool_current, 1);
            }
            _ => panic!("Expected PoolCommitted events"),
        }
    }

    #[test]
    fn event_types_are_namespaced() {
        let e = ProductEvent::ProductApproved(ProductApproved {
            product_id: test_product_id(),
            occurred_at: test_time(),
        });
        assert_eq!(e.event_type(), "products.product.approved");
        assert_eq!(e.version(), 1);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: any accepted submission satisfies pool ≤ per-item ≤ regular.
            #[test]
            fn accepted_products_respect_price_ordering(
                regular in 0u32..100_000,
                per_item in 0u32..100_000,
                pool in 0u32..100_000,
            ) {
                let mut draft = test_draft();
                draft.regular_price = f64::from(regular) / 100.0;
                draft.per_item_price = f64::from(per_item) / 100.0;
                draft.pool_price = f64::from(pool) / 100.0;

                let product_id = test_product_id();
                let product = Product::empty(product_id);
                let result = product.handle(&submit_cmd(product_id, draft));

                let ordered = per_item <= regular && pool <= per_item;
                prop_assert_eq!(result.is_ok(), ordered);
                if let Ok(events) = result {
                    let mut product = product.clone();
                    product.apply(&events[0]);
                    prop_assert!(product.per_item_price() <= product.regular_price());
                    prop_assert!(product.pool_price() <= product.per_item_price());
                }
            }

            /// Property: pool commitments add up exactly.
            #[test]
            fn commitments_accumulate(quantities in proptest::collection::vec(1u32..50, 1..20)) {
                let mut product = approved();
                for q in &quantities {
                    { let cmd = commit_cmd(product.id_typed(), *q); execute(&mut product, cmd) }.unwrap();
                }
                let total: u32 = quantities.iter().sum();
                prop_assert_eq!(product.pool_current(), total);
                prop_assert_eq!(product.version(), 2 + quantities.len() as u64);
                prop_assert_eq!(product.is_pool_complete(), total >= product.pool_size());
            }

            /// Property: apply is deterministic (same events = same final state).
            #[test]
            fn apply_is_deterministic(quantity in 1u32..1000) {
                let source = approved();
                let events = source.handle(&commit_cmd(source.id_typed(), quantity)).unwrap();

                let mut a = source.clone();
                let mut b = source.clone();
                for e in &events {
                    a.apply(e);
                    b.apply(e);
                }
                prop_assert_eq!(a, b);
            }
        }
    }
}
