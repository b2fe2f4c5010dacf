use crate::core::identifier::derive_identifier;
use crate::core::merge::merge_entry;
use crate::core::{
    CatalogStore, ConfigProvider, Pipeline, PriceFeed, Result, Storage,
};
use crate::domain::model::{Listing, LoadOutcome, PriceCatalogEntry, StoredGroup};
use crate::utils::error::EstimatorError;
use crate::utils::export::write_listing_csv;
use url::Url;

/// Where the drained listing is archived.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub json_path: String,
    pub csv_path: Option<String>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            json_path: "prices.json".to_string(),
            csv_path: None,
        }
    }
}

/// Archive target for pipelines built without one. Never written to.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArchive;

impl Storage for NoArchive {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Err(EstimatorError::ConfigError {
            message: format!("no archive configured to read '{}'", path),
        })
    }

    async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Drains the retail prices feed and merges every consumption entry into the
/// catalog store.
pub struct CatalogPipeline<F: PriceFeed, S: CatalogStore, C: ConfigProvider, A: Storage = NoArchive>
{
    feed: F,
    store: S,
    config: C,
    archive: Option<(A, ArchiveOptions)>,
}

impl<F: PriceFeed, S: CatalogStore, C: ConfigProvider> CatalogPipeline<F, S, C, NoArchive> {
    pub fn new(feed: F, store: S, config: C) -> Self {
        Self {
            feed,
            store,
            config,
            archive: None,
        }
    }

    /// Also dump the full drained listing to `archive` before merging.
    pub fn with_archive<A: Storage>(
        self,
        archive: A,
        options: ArchiveOptions,
    ) -> CatalogPipeline<F, S, C, A> {
        CatalogPipeline {
            feed: self.feed,
            store: self.store,
            config: self.config,
            archive: Some((archive, options)),
        }
    }
}

impl<F: PriceFeed, S: CatalogStore, C: ConfigProvider, A: Storage> CatalogPipeline<F, S, C, A> {
    pub fn store(&self) -> &S {
        &self.store
    }

    /// URL of the first page: the endpoint plus the optional `$filter`.
    fn first_page_url(&self) -> Result<String> {
        let endpoint = self.config.feed_endpoint();
        let Some(filter) = self.config.feed_filter().filter(|f| !f.trim().is_empty()) else {
            return Ok(endpoint.to_string());
        };

        let mut url = Url::parse(endpoint).map_err(|e| EstimatorError::InvalidConfigValueError {
            field: "feed_endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("$filter", filter);
        Ok(url.to_string())
    }

    async fn archive_listing(&self, items: &[PriceCatalogEntry]) {
        let Some((archive, options)) = &self.archive else {
            return;
        };

        match serde_json::to_vec(items) {
            Ok(json) => match archive.write_file(&options.json_path, &json).await {
                Ok(()) => tracing::info!(
                    path = %options.json_path,
                    bytes = json.len(),
                    "Archived price listing"
                ),
                Err(e) => tracing::warn!(path = %options.json_path, error = %e, "Failed to archive price listing"),
            },
            Err(e) => tracing::warn!(error = %e, "Failed to serialize price listing"),
        }

        if let Some(csv_path) = &options.csv_path {
            let written = write_listing_csv(items).map(|csv| (csv.len(), csv));
            let result = match written {
                Ok((len, csv)) => archive.write_file(csv_path, &csv).await.map(|_| len),
                Err(e) => Err(e),
            };
            match result {
                Ok(bytes) => tracing::info!(path = %csv_path, bytes, "Exported price listing as CSV"),
                Err(e) => tracing::warn!(path = %csv_path, error = %e, "Failed to export CSV"),
            }
        }
    }

    /// Read-merge-write one entry into its group.
    ///
    /// A group that cannot be read or decoded is left untouched rather than
    /// overwritten with a single-entry group.
    async fn persist_entry(&self, id: &str, entry: PriceCatalogEntry) -> Result<()> {
        let existing = match self.store.get(id).await? {
            Some(blob) => StoredGroup::from_stored(id, &blob)?.items,
            None => Vec::new(),
        };

        let merged = StoredGroup::new(id, merge_entry(existing, entry));
        self.store.put(id, &merged.to_blob()?).await
    }
}

#[async_trait::async_trait]
impl<F: PriceFeed, S: CatalogStore, C: ConfigProvider, A: Storage> Pipeline
    for CatalogPipeline<F, S, C, A>
{
    async fn extract(&self) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut next = Some(self.first_page_url()?);

        while let Some(url) = next.take() {
            if let Some(max_pages) = self.config.max_pages() {
                if listing.pages >= max_pages {
                    tracing::warn!(max_pages, next = %url, "Page limit reached, stopping pagination");
                    break;
                }
            }

            tracing::debug!(page = listing.pages + 1, url = %url, "GET");
            let page = self.feed.fetch_page(&url).await?;
            listing.pages += 1;

            next = page.next_link().map(str::to_string);
            tracing::info!(
                page = listing.pages,
                items = page.items.len(),
                has_next = next.is_some(),
                "Fetched price page"
            );
            listing.items.extend(page.items);
        }

        self.archive_listing(&listing.items).await;
        Ok(listing)
    }

    async fn transform(&self, data: Vec<PriceCatalogEntry>) -> Result<Vec<PriceCatalogEntry>> {
        let total = data.len();
        let consumption: Vec<PriceCatalogEntry> =
            data.into_iter().filter(PriceCatalogEntry::is_consumption).collect();

        tracing::debug!(
            kept = consumption.len(),
            dropped = total - consumption.len(),
            "Filtered listing to consumption prices"
        );
        Ok(consumption)
    }

    async fn load(&self, entries: Vec<PriceCatalogEntry>) -> Result<LoadOutcome> {
        let mut outcome = LoadOutcome::default();

        for entry in entries {
            let id = derive_identifier(&entry);
            tracing::debug!(id = %id, meter_id = %entry.meter_id, "Processing");
            outcome.attempted += 1;

            match self.persist_entry(&id, entry).await {
                Ok(()) => outcome.written += 1,
                Err(EstimatorError::PersistenceError { reason, message, .. }) => {
                    tracing::error!(id = %id, %reason, error = %message, "Failed to persist price group");
                    outcome.failed += 1;
                }
                Err(e) => {
                    tracing::error!(id = %id, error = %e, "Failed to merge price group");
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}
