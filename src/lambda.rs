use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use azure_cost_estimator::adapters::aws::{load_sdk_config, DynamoCatalogStore, S3Storage};
use azure_cost_estimator::domain::model::SyncReport;
use azure_cost_estimator::utils::{logger, validation::Validate};
use azure_cost_estimator::{ArchiveOptions, CatalogPipeline, HttpPriceFeed, LambdaConfig, SyncEngine};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub report: SyncReport,
}

/// Scheduled trigger; the event body is ignored.
async fn function_handler(event: LambdaEvent<serde_json::Value>) -> Result<Response, Error> {
    tracing::info!(request_id = %event.context.request_id, "Starting catalog sync Lambda");

    // 創建Lambda配置
    let config = LambdaConfig::from_env()?;
    config.validate()?;

    let sdk_config = load_sdk_config(config.region.as_deref()).await;
    let store = DynamoCatalogStore::new(DynamoClient::new(&sdk_config), config.dynamo_table.clone());
    let bucket = config.s3_bucket.clone();
    let archive_key = config.archive_key.clone();
    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store, config);

    let result = match bucket {
        Some(bucket) => {
            let archive = S3Storage::new(S3Client::new(&sdk_config), bucket);
            let options = ArchiveOptions {
                json_path: archive_key,
                csv_path: None,
            };
            SyncEngine::new(pipeline.with_archive(archive, options)).run().await
        }
        None => SyncEngine::new(pipeline).run().await,
    };

    let report = result.map_err(|e| {
        tracing::error!(error = %e, category = ?e.category(), "❌ Catalog sync failed");
        e
    })?;

    tracing::info!("Catalog sync Lambda completed successfully");
    Ok(Response {
        message: "Catalog sync completed successfully".to_string(),
        report,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();
    run(service_fn(function_handler)).await
}
