use crate::domain::model::{
    Listing, LoadOutcome, PriceCatalogEntry, PricingPage, ShapePolicy, StoredGroup,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Blob storage for archival artifacts (S3, local directory).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Key/value store holding one serialized `StoredGroup` per identifier.
///
/// Implementations report store failures as `EstimatorError::PersistenceError`
/// with a classified reason.
pub trait CatalogStore: Send + Sync {
    fn get(&self, id: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn put(&self, id: &str, blob: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source of retail price pages.
pub trait PriceFeed: Send + Sync {
    /// Fetch one page. Transport failures and non-2xx statuses are errors.
    fn fetch_page(&self, url: &str) -> impl std::future::Future<Output = Result<PricingPage>> + Send;
}

/// Read access to priced groups, used by pricing rules.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn group(&self, id: &str) -> Result<Option<StoredGroup>>;
}

pub trait ConfigProvider: Send + Sync {
    fn feed_endpoint(&self) -> &str;
    fn feed_filter(&self) -> Option<&str>;
    fn max_pages(&self) -> Option<usize>;
    fn target_provider(&self) -> &str;
    fn shape_policy(&self) -> ShapePolicy;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Listing>;
    async fn transform(&self, data: Vec<PriceCatalogEntry>) -> Result<Vec<PriceCatalogEntry>>;
    async fn load(&self, entries: Vec<PriceCatalogEntry>) -> Result<LoadOutcome>;
}
