//! Products domain module (event-sourced).
//!
//! Catalog entries, seller drafts, moderation and the dual-pricing model,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod draft;
pub mod pricing;
pub mod product;
pub mod query;

pub use draft::{DEFAULT_LOCALE, MAX_RATING, ProductDetails, ProductDraft, ValidatedDraft};
pub use pricing::{
    PurchaseType, discount_percent, effective_unit_price, is_pool_complete, line_total,
    pool_completion_ratio,
};
pub use product::{
    ApproveProduct, CommitToPool, ModerationState, PoolCommitment, PoolCommitted, Product,
    ProductApproved, ProductCommand, ProductEvent, ProductId, ProductRejected, ProductSubmitted,
    RejectProduct, SubmitProduct,
};
pub use query::{ProductFilter, derived_categories, newest_first};
