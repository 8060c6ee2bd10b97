//! Read-side projections fed by the command pipeline.

pub mod products;

pub use products::ProductCatalogProjection;
