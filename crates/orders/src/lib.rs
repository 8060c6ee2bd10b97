//! Order intake domain: carts, purchase intents, quotes and receipts.
//!
//! Pure logic. Looking products up and advancing pool counters is left to the
//! caller.

pub mod cart;
pub mod intent;
pub mod receipt;

pub use cart::{Cart, CartLine};
pub use intent::{PurchaseIntent, Quote, quote};
pub use receipt::{Receipt, ReceiptId};
