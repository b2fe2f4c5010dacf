pub mod etl;
pub mod identifier;
pub mod merge;
pub mod pipeline;
pub mod pricer;
pub mod rules;

pub use crate::domain::model::{PriceCatalogEntry, PriceEstimate, StoredGroup, SyncReport};
pub use crate::domain::ports::{
    CatalogStore, ConfigProvider, Pipeline, PriceFeed, PriceSource, Storage,
};
pub use crate::utils::error::Result;
