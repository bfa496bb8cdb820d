// Library entry point for token-resolver

pub mod cache;
pub mod catalog;
pub mod chain;
pub mod config;
pub mod price_engine;
pub mod resolver;
pub mod sources;
pub mod store;
pub mod token;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use catalog::{CatalogIngestor, IngestReport};
pub use config::{AppConfig, PricingConfig};
pub use price_engine::PriceEngine;
pub use resolver::TokenResolver;
pub use token::{PricePoint, PriceSource, Token};
pub use types::{ResolverError, Result};
