use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("azure_cost_estimator=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("azure_cost_estimator=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
}

/// Library events plus the two Lambda binaries' own targets.
const LAMBDA_DIRECTIVE: &str = "azure_cost_estimator=info,sync_lambda=info,estimate_lambda=info,warn";

pub fn init_lambda_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LAMBDA_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .without_time() // CloudWatch stamps every line already
                .json()
                .flatten_event(true),
        )
        .init();
}
