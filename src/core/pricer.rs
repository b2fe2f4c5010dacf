use crate::core::rules::RuleRegistry;
use crate::core::{CatalogStore, ConfigProvider, PriceSource};
use crate::domain::model::{PriceEstimate, PriceItem, ShapePolicy, StoredGroup};
use crate::domain::plan::{Plan, AZURERM_PROVIDER};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Reads priced groups straight from the catalog store the sync writes.
pub struct CatalogPriceSource<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> CatalogPriceSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: CatalogStore> PriceSource for CatalogPriceSource<S> {
    async fn group(&self, id: &str) -> Result<Option<StoredGroup>> {
        match self.store.get(id).await? {
            Some(blob) => Ok(Some(StoredGroup::from_stored(id, &blob)?)),
            None => Ok(None),
        }
    }
}

/// Prices the resource changes of a Terraform plan.
pub struct PlanPricer<P: PriceSource> {
    registry: RuleRegistry,
    prices: P,
    target_provider: String,
    policy: ShapePolicy,
}

impl<P: PriceSource> PlanPricer<P> {
    pub fn new(prices: P) -> Self {
        Self {
            registry: RuleRegistry::with_defaults(),
            prices,
            target_provider: AZURERM_PROVIDER.to_string(),
            policy: ShapePolicy::default(),
        }
    }

    pub fn from_config(prices: P, config: &impl ConfigProvider) -> Self {
        Self::new(prices)
            .with_target_provider(config.target_provider())
            .with_policy(config.shape_policy())
    }

    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_target_provider(mut self, provider: impl Into<String>) -> Self {
        self.target_provider = provider.into();
        self
    }

    pub fn with_policy(mut self, policy: ShapePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Parse a plan document and price it.
    pub async fn price_plan_json(&self, json: &str) -> Result<PriceEstimate> {
        let plan = Plan::from_json(json)?;
        self.price_plan(&plan).await
    }

    pub async fn price_plan(&self, plan: &Plan) -> Result<PriceEstimate> {
        let mut items = Vec::new();

        for change in &plan.resource_changes {
            if change.provider != self.target_provider {
                continue;
            }
            let Some(rule) = self.registry.get(&change.resource_type) else {
                continue;
            };
            let Some(after) = change.change.after.as_ref().filter(|v| !v.is_null()) else {
                tracing::debug!(resource = change.label(), "Resource is being destroyed, not priced");
                continue;
            };

            match rule.hourly_rate(change.label(), after, &self.prices).await {
                Ok(rate) => items.push(PriceItem {
                    resource_type: change.resource_type.clone(),
                    address: change.address.clone(),
                    hourly_price: rate,
                }),
                Err(e) if e.is_resource_scoped() && self.policy == ShapePolicy::Skip => {
                    tracing::warn!(resource = change.label(), error = %e, "Skipping resource");
                }
                Err(e) => return Err(e),
            }
        }

        let estimate = PriceEstimate::from_items(items);
        tracing::info!(
            resources = estimate.price_items.len(),
            hourly = estimate.hourly,
            "Priced plan"
        );
        Ok(estimate)
    }
}
