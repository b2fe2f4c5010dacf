//! Pricing rules for Terraform resource types.
//!
//! A rule turns the `after` state of one resource change into an hourly rate.
//! Rules are looked up by resource type in a [`RuleRegistry`]; types without a
//! rule are not priced.

use crate::core::identifier::group_identifier;
use crate::core::PriceSource;
use crate::domain::model::PriceCatalogEntry;
use crate::utils::error::{EstimatorError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

const VIRTUAL_MACHINES_SERVICE: &str = "Virtual Machines";
const HOURLY_UNIT: &str = "1 Hour";

#[async_trait]
pub trait PricingRule: Send + Sync {
    /// Terraform resource type this rule prices, e.g. `azurerm_linux_virtual_machine`.
    fn resource_type(&self) -> &str;

    /// Hourly USD rate for one resource.
    ///
    /// `resource` is the label used in errors. Missing or malformed attributes
    /// are a `ShapeError`; a catalog without a matching meter is `PriceNotFound`.
    async fn hourly_rate(
        &self,
        resource: &str,
        after: &serde_json::Value,
        prices: &dyn PriceSource,
    ) -> Result<f64>;
}

/// Deserialize a resource's `after` state into the rule's attribute struct.
pub fn typed_attributes<T: DeserializeOwned>(resource: &str, after: &serde_json::Value) -> Result<T> {
    T::deserialize(after).map_err(|e| EstimatorError::ShapeError {
        resource: resource.to_string(),
        message: e.to_string(),
    })
}

pub struct RuleRegistry {
    rules: HashMap<String, Box<dyn PricingRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry with every built-in rule.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(VirtualMachineRule::linux()));
        registry.register(Box::new(VirtualMachineRule::windows()));
        registry
    }

    /// Add a rule, replacing any rule already registered for its type.
    pub fn register(&mut self, rule: Box<dyn PricingRule>) {
        self.rules.insert(rule.resource_type().to_string(), rule);
    }

    pub fn get(&self, resource_type: &str) -> Option<&dyn PricingRule> {
        self.rules.get(resource_type).map(|rule| rule.as_ref())
    }

    pub fn supported_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Windows,
}

impl OsFamily {
    /// Windows meters carry a " Windows" suffix on the product name.
    fn matches(self, product_name: &str) -> bool {
        let windows = product_name.trim_end().ends_with("Windows");
        match self {
            OsFamily::Linux => !windows,
            OsFamily::Windows => windows,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualMachineAttributes {
    pub size: String,
    pub location: String,
}

/// `azurerm_linux_virtual_machine` / `azurerm_windows_virtual_machine`.
///
/// Reads the group for `Virtual Machines / <location> / <size>` and takes the
/// pay-as-you-go hourly meter of the matching OS.
pub struct VirtualMachineRule {
    resource_type: &'static str,
    os: OsFamily,
}

impl VirtualMachineRule {
    pub fn linux() -> Self {
        Self {
            resource_type: "azurerm_linux_virtual_machine",
            os: OsFamily::Linux,
        }
    }

    pub fn windows() -> Self {
        Self {
            resource_type: "azurerm_windows_virtual_machine",
            os: OsFamily::Windows,
        }
    }

    fn select_meter<'a>(&self, items: &'a [PriceCatalogEntry]) -> Option<&'a PriceCatalogEntry> {
        items
            .iter()
            .filter(|e| e.is_consumption())
            .filter(|e| e.unit_of_measure.eq_ignore_ascii_case(HOURLY_UNIT))
            .filter(|e| !is_discounted_sku(&e.sku_name))
            .filter(|e| self.os.matches(&e.product_name))
            .min_by(|a, b| a.tier_minimum_units.total_cmp(&b.tier_minimum_units))
    }
}

/// Spot and Low Priority meters share the size's group but are not the
/// on-demand price.
fn is_discounted_sku(sku_name: &str) -> bool {
    sku_name.contains("Spot") || sku_name.contains("Low Priority")
}

/// "East US" and "eastus" both name the `eastus` region.
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

#[async_trait]
impl PricingRule for VirtualMachineRule {
    fn resource_type(&self) -> &str {
        self.resource_type
    }

    async fn hourly_rate(
        &self,
        resource: &str,
        after: &serde_json::Value,
        prices: &dyn PriceSource,
    ) -> Result<f64> {
        let attrs: VirtualMachineAttributes = typed_attributes(resource, after)?;
        if attrs.size.trim().is_empty() || attrs.location.trim().is_empty() {
            return Err(EstimatorError::ShapeError {
                resource: resource.to_string(),
                message: "`size` and `location` must not be empty".to_string(),
            });
        }

        let region = normalize_location(&attrs.location);
        let id = group_identifier(VIRTUAL_MACHINES_SERVICE, &region, &attrs.size);
        let not_found = || EstimatorError::PriceNotFound {
            resource: resource.to_string(),
            lookup: format!("{:?} meter in {}", self.os, id),
        };

        let group = prices.group(&id).await?.ok_or_else(not_found)?;
        let meter = self.select_meter(&group.items).ok_or_else(not_found)?;

        tracing::debug!(
            resource,
            id = %id,
            meter_id = %meter.meter_id,
            rate = meter.retail_price,
            "Priced virtual machine"
        );
        Ok(meter.retail_price)
    }
}
