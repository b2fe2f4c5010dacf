use crate::adapters::http::AZURE_RETAIL_PRICES_API;
use crate::core::ConfigProvider;
use crate::domain::model::ShapePolicy;
use crate::domain::plan::AZURERM_PROVIDER;
use crate::utils::error::{EstimatorError, Result};
use crate::utils::validation::{
    validate_positive_number, validate_s3_bucket_name, validate_table_name, validate_url, Validate,
};
use std::env;

/// Settings of the Lambda handlers, read from the function environment.
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub api_endpoint: String,
    pub feed_filter: Option<String>,
    pub max_pages: Option<usize>,
    pub dynamo_table: String,
    pub s3_bucket: Option<String>,
    pub archive_key: String,
    pub region: Option<String>,
    pub target_provider: String,
    pub shape_policy: ShapePolicy,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_pages = match non_empty("MAX_PAGES") {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|e| {
                EstimatorError::InvalidConfigValueError {
                    field: "MAX_PAGES".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let shape_policy = match non_empty("SHAPE_POLICY") {
            Some(raw) => raw.parse()?,
            None => ShapePolicy::Skip,
        };

        Ok(Self {
            api_endpoint: non_empty("PRICING_API_ENDPOINT")
                .unwrap_or_else(|| AZURE_RETAIL_PRICES_API.to_string()),
            feed_filter: non_empty("PRICING_FILTER"),
            max_pages,
            dynamo_table: non_empty("DYNAMO_TABLE").ok_or_else(|| {
                EstimatorError::MissingConfigError {
                    field: "DYNAMO_TABLE".to_string(),
                }
            })?,
            s3_bucket: non_empty("S3_BUCKET"),
            archive_key: non_empty("S3_KEY").unwrap_or_else(|| "prices.json".to_string()),
            region: non_empty("AWS_REGION"),
            target_provider: non_empty("TARGET_PROVIDER")
                .unwrap_or_else(|| AZURERM_PROVIDER.to_string()),
            shape_policy,
        })
    }
}

impl ConfigProvider for LambdaConfig {
    fn feed_endpoint(&self) -> &str {
        &self.api_endpoint
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

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        // 驗證API端點
        validate_url("PRICING_API_ENDPOINT", &self.api_endpoint)?;

        // 驗證 DynamoDB 表名
        validate_table_name("DYNAMO_TABLE", &self.dynamo_table)?;

        // 驗證S3 bucket名稱
        if let Some(bucket) = &self.s3_bucket {
            validate_s3_bucket_name("S3_BUCKET", bucket)?;
        }

        if let Some(max_pages) = self.max_pages {
            validate_positive_number("MAX_PAGES", max_pages, 1)?;
        }

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}
