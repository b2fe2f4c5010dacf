use crate::config::Settings;
use crate::domain::model::ShapePolicy;
use crate::utils::error::{EstimatorError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional config file; every section and key may be omitted.
///
/// ```toml
/// [feed]
/// endpoint = "https://prices.azure.com/api/retail/prices"
/// filter = "serviceName eq 'Virtual Machines'"
///
/// [catalog]
/// dir = "${HOME}/.cache/azure-prices"
///
/// [pricer]
/// on_shape_error = "fail"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub pricer: PricerSection,
    #[serde(default)]
    pub archive: ArchiveSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSection {
    pub endpoint: Option<String>,
    pub filter: Option<String>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricerSection {
    pub target_provider: Option<String>,
    pub on_shape_error: Option<ShapePolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveSection {
    pub dir: Option<String>,
    pub csv: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EstimatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HOME})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// File values layered over the built-in defaults.
    pub fn into_settings(self) -> Settings {
        let mut settings = Settings::default();

        if let Some(endpoint) = self.feed.endpoint {
            settings.feed_endpoint = endpoint;
        }
        settings.feed_filter = self.feed.filter;
        settings.max_pages = self.feed.max_pages;
        if let Some(dir) = self.catalog.dir {
            settings.catalog_dir = dir;
        }
        if let Some(provider) = self.pricer.target_provider {
            settings.target_provider = provider;
        }
        if let Some(policy) = self.pricer.on_shape_error {
            settings.shape_policy = policy;
        }
        settings.archive_dir = self.archive.dir;
        settings.export_csv = self.archive.csv.unwrap_or(false);

        settings
    }
}
