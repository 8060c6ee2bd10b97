//! Process-wide logging setup for the marketplace binaries.

/// Subscriber configuration (filters, JSON formatting).
pub mod tracing;

pub use crate::tracing::{DEFAULT_FILTER, init, init_with_default};
