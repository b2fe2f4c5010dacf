//! The slice of `terraform show -json` output the pricer reads.

use crate::utils::error::{EstimatorError, Result};
use serde::Deserialize;

/// Provider address of the AzureRM provider in plan output.
pub const AZURERM_PROVIDER: &str = "registry.terraform.io/hashicorp/azurerm";

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

impl Plan {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EstimatorError::parse("plan", e))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceChange {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(rename = "provider_name")]
    pub provider: String,
    pub change: Change,
}

impl ResourceChange {
    /// Name used in logs and errors: the plan address when present.
    pub fn label(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.resource_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    /// Desired attributes; `None` when the resource is being destroyed.
    #[serde(default)]
    pub after: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_plan() {
        let plan = Plan::from_json(
            r#"{
                "format_version": "1.2",
                "resource_changes": [{
                    "address": "azurerm_linux_virtual_machine.web",
                    "type": "azurerm_linux_virtual_machine",
                    "provider_name": "registry.terraform.io/hashicorp/azurerm",
                    "change": {"actions": ["create"], "after": {"size": "Standard_B1s"}}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.resource_changes.len(), 1);
        let change = &plan.resource_changes[0];
        assert_eq!(change.provider, AZURERM_PROVIDER);
        assert_eq!(change.label(), "azurerm_linux_virtual_machine.web");
        assert!(change.change.after.is_some());
    }

    #[test]
    fn test_destroyed_resource_has_no_after() {
        let plan = Plan::from_json(
            r#"{"resource_changes": [{
                "type": "azurerm_linux_virtual_machine",
                "provider_name": "registry.terraform.io/hashicorp/azurerm",
                "change": {"actions": ["delete"], "after": null}
            }]}"#,
        )
        .unwrap();
        assert!(plan.resource_changes[0].change.after.is_none());
        assert_eq!(plan.resource_changes[0].label(), "azurerm_linux_virtual_machine");
    }

    #[test]
    fn test_plan_without_changes_is_empty() {
        let plan = Plan::from_json(r#"{"format_version": "1.2"}"#).unwrap();
        assert!(plan.resource_changes.is_empty());
    }

    #[test]
    fn test_malformed_plan_is_parse_error() {
        let err = Plan::from_json("{\"resource_changes\": [").unwrap_err();
        assert!(matches!(err, EstimatorError::ParseError { .. }));
    }
}
