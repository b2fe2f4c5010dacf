use crate::domain::model::PricingPage;
use crate::domain::ports::PriceFeed;
use crate::utils::error::{EstimatorError, Result};
use reqwest::Client;

/// Azure Retail Prices API endpoint.
pub const AZURE_RETAIL_PRICES_API: &str = "https://prices.azure.com/api/retail/prices";

/// Fetches retail price pages over HTTP. No retries; a failed page ends the sync.
#[derive(Debug, Clone, Default)]
pub struct HttpPriceFeed {
    client: Client,
}

impl HttpPriceFeed {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl PriceFeed for HttpPriceFeed {
    async fn fetch_page(&self, url: &str) -> Result<PricingPage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!(url, status = status.as_u16(), "Price page response");

        if !status.is_success() {
            return Err(EstimatorError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| EstimatorError::parse("price page", e))
    }
}
