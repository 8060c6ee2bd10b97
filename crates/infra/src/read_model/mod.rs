//! Disposable read model storage.

pub mod receipts;
pub mod store;

pub use receipts::ReceiptBook;
pub use store::{InMemoryReadStore, ReadStore};
