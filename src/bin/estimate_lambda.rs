use aws_sdk_dynamodb::Client as DynamoClient;
use azure_cost_estimator::adapters::aws::{load_sdk_config, DynamoCatalogStore};
use azure_cost_estimator::app::estimate_api::{handle_estimate, ApiRequest, ApiResponse};
use azure_cost_estimator::utils::{logger, validation::Validate};
use azure_cost_estimator::{CatalogPriceSource, LambdaConfig, PlanPricer};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

type Pricer = PlanPricer<CatalogPriceSource<DynamoCatalogStore>>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時建立一次，之後的呼叫共用
    let config = LambdaConfig::from_env()?;
    config.validate()?;
    let sdk_config = load_sdk_config(config.region.as_deref()).await;
    let store = DynamoCatalogStore::new(DynamoClient::new(&sdk_config), config.dynamo_table.clone());
    let pricer: Pricer = PlanPricer::from_config(CatalogPriceSource::new(store), &config);
    let pricer = &pricer;

    run(service_fn(move |event: LambdaEvent<ApiRequest>| async move {
        tracing::info!(request_id = %event.context.request_id, "Pricing plan");
        Ok::<ApiResponse, Error>(handle_estimate(pricer, &event.payload).await)
    }))
    .await
}
