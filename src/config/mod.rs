#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::adapters::http::AZURE_RETAIL_PRICES_API;
use crate::core::ConfigProvider;
use crate::domain::model::ShapePolicy;
use crate::domain::plan::AZURERM_PROVIDER;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use serde::{Deserialize, Serialize};

/// Resolved settings for local runs: file values with CLI overrides applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub feed_endpoint: String,
    pub feed_filter: Option<String>,
    pub max_pages: Option<usize>,
    pub target_provider: String,
    pub shape_policy: ShapePolicy,
    pub catalog_dir: String,
    pub archive_dir: Option<String>,
    pub export_csv: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_endpoint: AZURE_RETAIL_PRICES_API.to_string(),
            feed_filter: None,
            max_pages: None,
            target_provider: AZURERM_PROVIDER.to_string(),
            shape_policy: ShapePolicy::Skip,
            catalog_dir: "./catalog".to_string(),
            archive_dir: None,
            export_csv: false,
        }
    }
}

impl ConfigProvider for Settings {
    fn feed_endpoint(&self) -> &str {
        &self.feed_endpoint
    }

    fn feed_filter(&self) -> Option<&str> {
        self.feed_filter.as_deref()
    }

    fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    fn target_provider(&self) -> &str {
        &self.target_provider
    }

    fn shape_policy(&self) -> ShapePolicy {
        self.shape_policy
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("feed.endpoint", &self.feed_endpoint)?;
        if let Some(max_pages) = self.max_pages {
            validate_positive_number("feed.max_pages", max_pages, 1)?;
        }
        validate_non_empty_string("pricer.target_provider", &self.target_provider)?;
        validate_path("catalog.dir", &self.catalog_dir)?;
        if let Some(dir) = &self.archive_dir {
            validate_path("archive.dir", dir)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
