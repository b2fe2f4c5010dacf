use anyhow::Context;
use azure_cost_estimator::config::cli::{Command, EstimateArgs};
use azure_cost_estimator::utils::error::{EstimatorError, ErrorSeverity};
use azure_cost_estimator::utils::{logger, validation::Validate};
use azure_cost_estimator::{
    ArchiveOptions, CatalogPipeline, CatalogPriceSource, CliConfig, HttpPriceFeed,
    LocalCatalogStore, LocalStorage, PlanPricer, Settings, SyncEngine,
};
use clap::Parser;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e, "Configuration validation failed"),
    };

    let result = match &cli.command {
        Command::Sync(_) => sync(settings).await,
        Command::Estimate(args) => estimate(settings, args).await,
    };

    if let Err(e) = result {
        // 非領域錯誤 (例如讀取計畫檔失敗) 交給 anyhow
        match e.downcast_ref::<EstimatorError>() {
            Some(err) => exit_with(err, "Command failed"),
            None => return Err(e),
        }
    }

    Ok(())
}

async fn sync(settings: Settings) -> anyhow::Result<()> {
    tracing::info!("🔄 Syncing retail prices into {}", settings.catalog_dir);

    let store = LocalCatalogStore::new(&settings.catalog_dir);
    let archive_dir = settings.archive_dir.clone();
    let export_csv = settings.export_csv;
    let pipeline = CatalogPipeline::new(HttpPriceFeed::new(), store, settings);

    // 有無歸檔目錄會產生不同的管道型別
    let report = match archive_dir {
        Some(dir) => {
            let options = ArchiveOptions {
                json_path: "prices.json".to_string(),
                csv_path: export_csv.then(|| "prices.csv".to_string()),
            };
            let pipeline = pipeline.with_archive(LocalStorage::new(dir), options);
            SyncEngine::new(pipeline).run().await?
        }
        None => SyncEngine::new(pipeline).run().await?,
    };

    println!("✅ Catalog sync completed successfully!");
    println!(
        "📄 {} pages, {} items fetched, {} consumption prices merged",
        report.pages_fetched, report.items_fetched, report.groups_written
    );
    Ok(())
}

async fn estimate(settings: Settings, args: &EstimateArgs) -> anyhow::Result<()> {
    let plan_json = if args.plan == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read plan from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(&args.plan)
            .await
            .with_context(|| format!("failed to read plan file '{}'", args.plan))?
    };

    let prices = CatalogPriceSource::new(LocalCatalogStore::new(&settings.catalog_dir));
    let pricer = PlanPricer::from_config(prices, &settings);
    let estimate = pricer.price_plan_json(&plan_json).await?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&estimate)?
    } else {
        serde_json::to_string(&estimate)?
    };
    println!("{}", output);
    Ok(())
}

fn exit_with(e: &EstimatorError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
