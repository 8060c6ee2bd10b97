//! Append-only event store boundary.
//!
//! Storage-agnostic: the in-memory implementation backs tests and the default
//! server wiring.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
