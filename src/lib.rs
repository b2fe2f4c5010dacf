pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{lambda::LambdaConfig, Settings};

pub use adapters::http::HttpPriceFeed;
pub use adapters::local::{LocalCatalogStore, LocalStorage};
pub use adapters::memory::InMemoryCatalogStore;
pub use core::{
    etl::SyncEngine,
    pipeline::{ArchiveOptions, CatalogPipeline},
    pricer::{CatalogPriceSource, PlanPricer},
    rules::{PricingRule, RuleRegistry},
};
pub use domain::model::{PriceCatalogEntry, PriceEstimate, ShapePolicy, StoredGroup, SyncReport};
pub use utils::error::{EstimatorError, Result};
