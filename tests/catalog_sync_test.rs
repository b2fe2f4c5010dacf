use azure_cost_estimator::core::CatalogStore;
use azure_cost_estimator::utils::error::{EstimatorError, PersistenceFailure, Result};
use azure_cost_estimator::{
    ArchiveOptions, CatalogPipeline, HttpPriceFeed, InMemoryCatalogStore, PriceCatalogEntry,
    Settings, StoredGroup, SyncEngine,
};
use httpmock::prelude::*;
use serde_json::{json, Value};

fn price(meter: &str, sku: &str, price_type: &str, retail: f64) -> Value {
    json!({
        "currencyCode": "USD",
        "tierMinimumUnits": 0.0,
        "retailPrice": retail,
        "unitPrice": retail,
        "armRegionName": "eastus",
        "location": "US East",
        "effectiveStartDate": "2024-01-01T00:00:00Z",
        "meterId": meter,
        "meterName": format!("{} Low Priority", sku),
        "productId": "DZH318Z0BQ4L",
        "skuId": "DZH318Z0BQ4L/00G3",
        "productName": "Virtual Machines BS Series",
        "skuName": sku,
        "serviceName": "Virtual Machines",
        "serviceId": "DZH313Z7MMC8",
        "serviceFamily": "Compute",
        "unitOfMeasure": "1 Hour",
        "type": price_type,
        "isPrimaryMeterRegion": true,
        "armSkuName": format!("Standard_{}", sku)
    })
}

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        feed_endpoint: server.url("/prices"),
        ..Settings::default()
    }
}

/// Three pages: five consumption meters over three SKUs, plus two
/// reservation prices that must never reach the store.
fn mock_three_pages(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(200).json_body(json!({
            "BillingCurrency": "USD",
            "Items": [
                price("m1", "B1s", "Consumption", 0.0104),
                price("m2", "B1s", "Consumption", 0.0052),
                price("r1", "B1s", "Reservation", 54.0)
            ],
            "NextPageLink": server.url("/prices/p2"),
            "Count": 3
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/prices/p2");
        then.status(200).json_body(json!({
            "Items": [
                price("m3", "B2s", "Consumption", 0.0416),
                price("r2", "B2s", "Reservation", 216.0)
            ],
            "NextPageLink": server.url("/prices/p3")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/prices/p3");
        then.status(200).json_body(json!({
            "Items": [
                price("m4", "D2s v3", "Consumption", 0.096),
                price("m5", "B2s", "Consumption", 0.0208)
            ],
            "NextPageLink": null
        }));
    });
}

async fn stored_group(store: &InMemoryCatalogStore, id: &str) -> StoredGroup {
    let blob = store.get_raw(id).await.expect("group should exist");
    StoredGroup::from_blob(id, &blob).unwrap()
}

fn meters(group: &StoredGroup) -> Vec<&str> {
    group.items.iter().map(|e| e.meter_id.as_str()).collect()
}

#[tokio::test]
async fn test_sync_stores_every_consumption_entry_once() {
    let server = MockServer::start();
    mock_three_pages(&server);
    let store = InMemoryCatalogStore::new();

    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
    let report = SyncEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.items_fetched, 7);
    assert_eq!(report.consumption_items, 5);
    assert_eq!(report.groups_written, 5);
    assert_eq!(report.failed, 0);

    assert_eq!(
        store.keys().await,
        vec![
            "azure:virtual-machines:eastus:standard_b1s",
            "azure:virtual-machines:eastus:standard_b2s",
            "azure:virtual-machines:eastus:standard_d2s-v3",
        ]
    );

    let b1s = stored_group(&store, "azure:virtual-machines:eastus:standard_b1s").await;
    assert_eq!(meters(&b1s), vec!["m1", "m2"]);
    let b2s = stored_group(&store, "azure:virtual-machines:eastus:standard_b2s").await;
    assert_eq!(meters(&b2s), vec!["m3", "m5"]);

    let total: usize = {
        let mut n = 0;
        for key in store.keys().await {
            let group = stored_group(&store, &key).await;
            assert!(group.items.iter().all(PriceCatalogEntry::is_consumption));
            n += group.items.len();
        }
        n
    };
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let server = MockServer::start();
    mock_three_pages(&server);
    let store = InMemoryCatalogStore::new();

    for _ in 0..2 {
        let pipeline =
            CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
        SyncEngine::new(pipeline).run().await.unwrap();
    }

    let b1s = stored_group(&store, "azure:virtual-machines:eastus:standard_b1s").await;
    assert_eq!(meters(&b1s), vec!["m1", "m2"]);
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn test_sync_refreshes_existing_meter_in_place() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(200).json_body(json!({
            "Items": [price("m2", "B1s", "Consumption", 0.0099)],
            "NextPageLink": ""
        }));
    });

    let id = "azure:virtual-machines:eastus:standard_b1s";
    let store = InMemoryCatalogStore::new();
    let existing = json!([
        price("m2", "B1s", "Consumption", 0.0052),
        price("m9", "B1s", "Consumption", 0.0104)
    ]);
    store
        .insert_raw(id, serde_json::to_vec(&existing).unwrap())
        .await;

    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
    SyncEngine::new(pipeline).run().await.unwrap();

    let group = stored_group(&store, id).await;
    assert_eq!(meters(&group), vec!["m2", "m9"]);
    assert_eq!(group.items[0].retail_price, 0.0099);
    assert_eq!(group.items[1].retail_price, 0.0104);
}

#[tokio::test]
async fn test_feed_error_aborts_before_writing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(500).body("upstream unavailable");
    });
    let store = InMemoryCatalogStore::new();

    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
    let err = SyncEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EstimatorError::HttpStatusError { status: 500, .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_error_on_later_page_writes_nothing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(200).json_body(json!({
            "Items": [price("m1", "B1s", "Consumption", 0.0104)],
            "NextPageLink": server.url("/prices/p2")
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/prices/p2");
        then.status(200).body("<html>not json</html>");
    });
    let store = InMemoryCatalogStore::new();

    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
    let err = SyncEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EstimatorError::ParseError { .. }));
    assert!(store.is_empty().await);
}

/// Rejects writes to one identifier, delegating everything else.
#[derive(Clone)]
struct RejectingStore {
    inner: InMemoryCatalogStore,
    reject: &'static str,
}

impl CatalogStore for RejectingStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(id).await
    }

    async fn put(&self, id: &str, blob: &[u8]) -> Result<()> {
        if id == self.reject {
            return Err(EstimatorError::PersistenceError {
                id: id.to_string(),
                reason: PersistenceFailure::ThroughputExceeded,
                message: "rate exceeded".to_string(),
            });
        }
        self.inner.put(id, blob).await
    }
}

#[tokio::test]
async fn test_store_failure_still_attempts_every_entry() {
    let server = MockServer::start();
    let items: Vec<Value> = ["A1", "A2", "A3", "A4", "A5"]
        .iter()
        .enumerate()
        .map(|(i, sku)| price(&format!("m{}", i), sku, "Consumption", 0.01))
        .collect();
    server.mock(|when, then| {
        when.method(GET).path("/prices");
        then.status(200).json_body(json!({ "Items": items, "NextPageLink": null }));
    });

    let store = RejectingStore {
        inner: InMemoryCatalogStore::new(),
        reject: "azure:virtual-machines:eastus:standard_a3",
    };
    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store.clone(), settings_for(&server));
    let engine = SyncEngine::new(pipeline);

    let report = engine.run_to_report().await.unwrap();
    assert_eq!(report.groups_written, 4);
    assert_eq!(report.failed, 1);
    assert!(!report.is_success());

    let err = engine.run().await.unwrap_err();
    assert!(matches!(
        err,
        EstimatorError::PartialFailure {
            failed: 1,
            attempted: 5
        }
    ));
    assert!(err.to_string().contains("unable to be written"));

    assert_eq!(store.inner.len().await, 4);
    assert!(store
        .inner
        .get_raw("azure:virtual-machines:eastus:standard_a3")
        .await
        .is_none());
}

#[tokio::test]
async fn test_archive_holds_full_listing() {
    let server = MockServer::start();
    mock_three_pages(&server);
    let store = InMemoryCatalogStore::new();
    let archive = InMemoryCatalogStore::new();

    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store, settings_for(&server))
        .with_archive(
            archive.clone(),
            ArchiveOptions {
                json_path: "dumps/prices.json".to_string(),
                csv_path: Some("dumps/prices.csv".to_string()),
            },
        );
    SyncEngine::new(pipeline).run().await.unwrap();

    let json = archive.get_raw("dumps/prices.json").await.unwrap();
    let archived: Vec<PriceCatalogEntry> = serde_json::from_slice(&json).unwrap();
    assert_eq!(archived.len(), 7);
    assert!(archived.iter().any(|e| e.price_type == "Reservation"));

    let csv = String::from_utf8(archive.get_raw("dumps/prices.csv").await.unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 8);
}

#[tokio::test]
async fn test_filter_is_sent_on_first_page() {
    let server = MockServer::start();
    let filtered = server.mock(|when, then| {
        when.method(GET)
            .path("/prices")
            .query_param("$filter", "serviceName eq 'Virtual Machines'");
        then.status(200).json_body(json!({ "Items": [], "NextPageLink": null }));
    });

    let settings = Settings {
        feed_filter: Some("serviceName eq 'Virtual Machines'".to_string()),
        ..settings_for(&server)
    };
    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), InMemoryCatalogStore::new(), settings);
    let report = SyncEngine::new(pipeline).run().await.unwrap();

    filtered.assert();
    assert_eq!(report.items_fetched, 0);
}
