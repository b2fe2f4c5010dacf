use azure_cost_estimator::domain::model::{HOURS_PER_MONTH, HOURS_PER_YEAR};
use azure_cost_estimator::{
    CatalogPipeline, CatalogPriceSource, EstimatorError, HttpPriceFeed, InMemoryCatalogStore,
    LocalCatalogStore, PlanPricer, Settings, ShapePolicy, SyncEngine,
};
use httpmock::prelude::*;
use serde_json::{json, Value};

const B1S_RATE: f64 = 0.0104;

fn vm_price(meter: &str, product: &str, sku: &str, retail: f64) -> Value {
    json!({
        "currencyCode": "USD",
        "tierMinimumUnits": 0.0,
        "retailPrice": retail,
        "unitPrice": retail,
        "armRegionName": "eastus",
        "location": "US East",
        "meterId": meter,
        "productName": product,
        "skuName": sku,
        "serviceName": "Virtual Machines",
        "unitOfMeasure": "1 Hour",
        "type": "Consumption",
        "armSkuName": "Standard_B1s"
    })
}

fn b1s_group() -> Value {
    json!([
        vm_price("spot", "Virtual Machines BS Series", "B1s Spot", 0.0021),
        vm_price("win", "Virtual Machines BS Series Windows", "B1s", 0.0146),
        vm_price("lin", "Virtual Machines BS Series", "B1s", B1S_RATE)
    ])
}

async fn seeded_store() -> InMemoryCatalogStore {
    let store = InMemoryCatalogStore::new();
    store
        .insert_raw(
            "azure:virtual-machines:eastus:standard_b1s",
            serde_json::to_vec(&b1s_group()).unwrap(),
        )
        .await;
    store
}

fn vm_change(address: &str, vm_type: &str, provider: &str, after: Value) -> Value {
    json!({
        "address": address,
        "mode": "managed",
        "type": vm_type,
        "name": "vm",
        "provider_name": provider,
        "change": { "actions": ["create"], "before": null, "after": after }
    })
}

const AZURERM: &str = "registry.terraform.io/hashicorp/azurerm";

fn b1s_after() -> Value {
    json!({ "size": "Standard_B1s", "location": "eastus", "admin_username": "adminuser" })
}

#[tokio::test]
async fn test_single_linux_vm() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(seeded_store().await));
    let plan = json!({
        "format_version": "1.2",
        "resource_changes": [vm_change("azurerm_linux_virtual_machine.web", "azurerm_linux_virtual_machine", AZURERM, b1s_after())]
    });

    let estimate = pricer.price_plan_json(&plan.to_string()).await.unwrap();

    assert_eq!(estimate.hourly, B1S_RATE);
    assert_eq!(estimate.monthly, B1S_RATE * HOURS_PER_MONTH);
    assert_eq!(estimate.yearly, B1S_RATE * HOURS_PER_YEAR);
    assert_eq!(estimate.price_items.len(), 1);
    assert_eq!(
        estimate.price_items[0].address.as_deref(),
        Some("azurerm_linux_virtual_machine.web")
    );
}

#[tokio::test]
async fn test_windows_vm_uses_windows_meter() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(seeded_store().await));
    let plan = json!({
        "resource_changes": [vm_change("azurerm_windows_virtual_machine.app", "azurerm_windows_virtual_machine", AZURERM, b1s_after())]
    });

    let estimate = pricer.price_plan_json(&plan.to_string()).await.unwrap();
    assert_eq!(estimate.hourly, 0.0146);
}

#[tokio::test]
async fn test_unsupported_and_foreign_resources_add_nothing() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(seeded_store().await));
    let plan = json!({
        "resource_changes": [
            vm_change("azurerm_linux_virtual_machine.a", "azurerm_linux_virtual_machine", AZURERM, b1s_after()),
            {
                "address": "azurerm_resource_group.rg",
                "type": "azurerm_resource_group",
                "provider_name": AZURERM,
                "change": { "after": { "name": "rg", "location": "eastus" } }
            },
            vm_change("aws_instance.x", "azurerm_linux_virtual_machine", "registry.terraform.io/hashicorp/aws", b1s_after())
        ]
    });

    let estimate = pricer.price_plan_json(&plan.to_string()).await.unwrap();
    assert_eq!(estimate.hourly, B1S_RATE);
    assert_eq!(estimate.price_items.len(), 1);
}

#[tokio::test]
async fn test_two_vms_sum() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(seeded_store().await));
    let plan = json!({
        "resource_changes": [
            vm_change("azurerm_linux_virtual_machine.a", "azurerm_linux_virtual_machine", AZURERM, b1s_after()),
            vm_change("azurerm_linux_virtual_machine.b", "azurerm_linux_virtual_machine", AZURERM,
                json!({ "size": "Standard_B1s", "location": "East US" }))
        ]
    });

    let estimate = pricer.price_plan_json(&plan.to_string()).await.unwrap();
    assert_eq!(estimate.hourly, B1S_RATE * 2.0);
}

#[tokio::test]
async fn test_empty_plan_is_zero() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(InMemoryCatalogStore::new()));
    let estimate = pricer.price_plan_json("{}").await.unwrap();

    assert_eq!(estimate.hourly, 0.0);
    assert_eq!(estimate.monthly, 0.0);
    assert_eq!(estimate.yearly, 0.0);
}

#[tokio::test]
async fn test_malformed_plan_is_parse_error() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(InMemoryCatalogStore::new()));

    let err = pricer.price_plan_json("not a plan").await.unwrap_err();
    assert!(matches!(err, EstimatorError::ParseError { .. }));
    assert_eq!(err.status_code(), 400);

    let err = pricer
        .price_plan_json(r#"{"resource_changes": {"oops": true}}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, EstimatorError::ParseError { .. }));
}

#[tokio::test]
async fn test_missing_price_under_fail_policy() {
    let pricer = PlanPricer::new(CatalogPriceSource::new(seeded_store().await))
        .with_policy(ShapePolicy::Fail);
    let plan = json!({
        "resource_changes": [vm_change("azurerm_linux_virtual_machine.big", "azurerm_linux_virtual_machine", AZURERM,
            json!({ "size": "Standard_M416ms_v2", "location": "eastus" }))]
    });

    let err = pricer.price_plan_json(&plan.to_string()).await.unwrap_err();
    assert!(matches!(err, EstimatorError::PriceNotFound { .. }));
    assert_eq!(err.status_code(), 422);
}

#[tokio::test]
async fn test_sync_then_estimate_from_local_catalog() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(200)
            .json_body(json!({ "Items": b1s_group(), "NextPageLink": null }));
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        feed_endpoint: server.url("/prices"),
        catalog_dir: dir.path().to_string_lossy().into_owned(),
        ..Settings::default()
    };

    let store = LocalCatalogStore::new(dir.path());
    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings.clone());
    let report = SyncEngine::new(pipeline).run().await.unwrap();
    assert_eq!(report.groups_written, 3);

    let pricer = PlanPricer::from_config(CatalogPriceSource::new(store), &settings);
    let plan = json!({
        "resource_changes": [vm_change("azurerm_linux_virtual_machine.web", "azurerm_linux_virtual_machine", AZURERM, b1s_after())]
    });
    let estimate = pricer.price_plan_json(&plan.to_string()).await.unwrap();

    assert_eq!(estimate.hourly, B1S_RATE);
    assert_eq!(estimate.yearly, B1S_RATE * HOURS_PER_YEAR);
}
