use crate::utils::error::{EstimatorError, PersistenceFailure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price type of pay-as-you-go entries in the Azure Retail Prices feed.
pub const CONSUMPTION_TYPE: &str = "Consumption";

/// One item of the Azure Retail Prices API.
///
/// Only the fields the estimator reads are modelled; everything else the feed
/// sends (savings plans, reservation terms) is kept in `extra` so a stored
/// group round-trips without losing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCatalogEntry {
    #[serde(rename = "type")]
    pub price_type: String,
    pub meter_id: String,
    #[serde(default)]
    pub meter_name: String,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub tier_minimum_units: f64,
    #[serde(default)]
    pub retail_price: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub arm_region_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub effective_start_date: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub sku_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub sku_name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub service_family: String,
    #[serde(default)]
    pub unit_of_measure: String,
    #[serde(default)]
    pub is_primary_meter_region: bool,
    #[serde(default)]
    pub arm_sku_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PriceCatalogEntry {
    pub fn is_consumption(&self) -> bool {
        self.price_type == CONSUMPTION_TYPE
    }
}

/// One page of the retail prices listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<PriceCatalogEntry>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

impl PricingPage {
    /// The link to follow, if any. Empty strings end pagination like `null`.
    pub fn next_link(&self) -> Option<&str> {
        self.next_page_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// Every item of a drained feed, in feed order.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub pages: usize,
    pub items: Vec<PriceCatalogEntry>,
}

/// Entries persisted together under one derived identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGroup {
    pub id: String,
    pub items: Vec<PriceCatalogEntry>,
}

impl StoredGroup {
    pub fn new(id: impl Into<String>, items: Vec<PriceCatalogEntry>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    /// Decode a stored blob (a JSON array of entries).
    pub fn from_blob(id: impl Into<String>, blob: &[u8]) -> Result<Self> {
        let id = id.into();
        let items = serde_json::from_slice(blob)
            .map_err(|e| EstimatorError::parse(format!("stored group '{}'", id), e))?;
        Ok(Self { id, items })
    }

    /// Decode a blob read back from the catalog store.
    ///
    /// Unlike `from_blob`, a bad blob is the store's problem rather than the
    /// caller's input, so it surfaces as a `Corrupt` persistence error.
    pub fn from_stored(id: &str, blob: &[u8]) -> Result<Self> {
        serde_json::from_slice(blob)
            .map(|items| Self::new(id, items))
            .map_err(|e| EstimatorError::PersistenceError {
                id: id.to_string(),
                reason: PersistenceFailure::Corrupt,
                message: e.to_string(),
            })
    }

    pub fn to_blob(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.items)?)
    }
}

/// Result of persisting a batch of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub attempted: usize,
    pub written: usize,
    pub failed: usize,
}

/// Summary of one catalog sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub pages_fetched: usize,
    pub items_fetched: usize,
    pub consumption_items: usize,
    pub groups_written: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Hours in the month and year figures of an estimate.
pub const HOURS_PER_MONTH: f64 = 730.0;
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// What the pricer does when one resource cannot be priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePolicy {
    /// Log the resource and leave it out of the total.
    #[default]
    Skip,
    /// Abort the whole estimate with the resource's error.
    Fail,
}

impl std::str::FromStr for ShapePolicy {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(ShapePolicy::Skip),
            "fail" => Ok(ShapePolicy::Fail),
            other => Err(EstimatorError::InvalidConfigValueError {
                field: "shape_policy".to_string(),
                value: other.to_string(),
                reason: "expected 'skip' or 'fail'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceItem {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub hourly_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    #[serde(rename = "estimated_hourly_cost_usd")]
    pub hourly: f64,
    #[serde(rename = "estimated_monthly_cost_usd")]
    pub monthly: f64,
    #[serde(rename = "estimated_yearly_cost_usd")]
    pub yearly: f64,
    #[serde(default)]
    pub price_items: Vec<PriceItem>,
}

impl PriceEstimate {
    pub fn from_items(price_items: Vec<PriceItem>) -> Self {
        let hourly: f64 = price_items.iter().map(|item| item.hourly_price).sum();
        Self {
            hourly,
            monthly: hourly * HOURS_PER_MONTH,
            yearly: hourly * HOURS_PER_YEAR,
            price_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_keeps_unmodelled_fields() {
        let raw = serde_json::json!({
            "type": "Consumption",
            "meterId": "m-1",
            "retailPrice": 0.0104,
            "serviceName": "Virtual Machines",
            "armSkuName": "Standard_B1s",
            "savingsPlan": [{"term": "1 Year", "retailPrice": 0.0081}]
        });

        let entry: PriceCatalogEntry = serde_json::from_value(raw.clone()).unwrap();
        assert!(entry.is_consumption());
        assert!(entry.extra.contains_key("savingsPlan"));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["savingsPlan"], raw["savingsPlan"]);
        assert_eq!(back["armSkuName"], "Standard_B1s");
    }

    #[test]
    fn test_next_link_treats_empty_as_end() {
        let page: PricingPage =
            serde_json::from_str(r#"{"Items": [], "NextPageLink": ""}"#).unwrap();
        assert_eq!(page.next_link(), None);

        let page: PricingPage = serde_json::from_str(r#"{"Items": [], "NextPageLink": null}"#).unwrap();
        assert_eq!(page.next_link(), None);

        let page: PricingPage =
            serde_json::from_str(r#"{"Items": [], "NextPageLink": "https://x/p2"}"#).unwrap();
        assert_eq!(page.next_link(), Some("https://x/p2"));
    }

    #[test]
    fn test_estimate_uses_fixed_calendar_hours() {
        let estimate = PriceEstimate::from_items(vec![PriceItem {
            resource_type: "azurerm_linux_virtual_machine".to_string(),
            address: None,
            hourly_price: 0.5,
        }]);
        assert_eq!(estimate.hourly, 0.5);
        assert_eq!(estimate.monthly, 365.0);
        assert_eq!(estimate.yearly, 4380.0);
    }

    #[test]
    fn test_corrupt_blob_is_parse_error() {
        let err = StoredGroup::from_blob("azure:x:y:z", b"not json").unwrap_err();
        assert!(matches!(err, EstimatorError::ParseError { .. }));
    }

    #[test]
    fn test_unreadable_stored_group_is_corrupt_not_parse_error() {
        let err = StoredGroup::from_stored("azure:x:global:y", b"{broken").unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::PersistenceError {
                reason: PersistenceFailure::Corrupt,
                ref id,
                ..
            } if id == "azure:x:global:y"
        ));
        assert_eq!(err.status_code(), 500);
    }
}
