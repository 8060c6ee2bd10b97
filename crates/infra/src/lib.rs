//! Infrastructure layer: event store, command pipeline, read models,
//! application services and configuration.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod services;

pub use config::{AppConfig, ConfigError};
pub use services::{Carts, Catalog, Marketplace, ModerationSummary, ModerationWorkflow, OrderIntake, PoolLedger};
