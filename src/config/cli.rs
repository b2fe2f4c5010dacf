use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::domain::model::ShapePolicy;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "azure-cost-estimator")]
#[command(about = "Estimate Azure costs of a Terraform plan from a synced retail price catalog")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding the local price catalog
    #[arg(long, global = true)]
    pub catalog_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Drain the retail prices feed into the local catalog
    Sync(SyncArgs),
    /// Price a plan exported with `terraform show -json`
    Estimate(EstimateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Retail prices API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// OData `$filter` applied to the first page, e.g. "serviceName eq 'Virtual Machines'"
    #[arg(long)]
    pub filter: Option<String>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Write the drained listing to this directory as prices.json
    #[arg(long)]
    pub archive_dir: Option<String>,

    /// Also write prices.csv next to the archived listing
    #[arg(long, requires = "archive_dir")]
    pub csv: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    /// Plan JSON file, or `-` for stdin
    pub plan: String,

    /// Provider address whose resources are priced
    #[arg(long)]
    pub target_provider: Option<String>,

    /// What to do with a resource that cannot be priced: skip or fail
    #[arg(long)]
    pub on_shape_error: Option<ShapePolicy>,

    /// Pretty-print the estimate JSON
    #[arg(long)]
    pub pretty: bool,
}

impl CliConfig {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.into_settings(),
            None => Settings::default(),
        };

        if let Some(dir) = &self.catalog_dir {
            settings.catalog_dir = dir.clone();
        }

        match &self.command {
            Command::Sync(args) => {
                if let Some(endpoint) = &args.endpoint {
                    settings.feed_endpoint = endpoint.clone();
                }
                if args.filter.is_some() {
                    settings.feed_filter = args.filter.clone();
                }
                if args.max_pages.is_some() {
                    settings.max_pages = args.max_pages;
                }
                if args.archive_dir.is_some() {
                    settings.archive_dir = args.archive_dir.clone();
                }
                settings.export_csv |= args.csv;
            }
            Command::Estimate(args) => {
                if let Some(provider) = &args.target_provider {
                    settings.target_provider = provider.clone();
                }
                if let Some(policy) = args.on_shape_error {
                    settings.shape_policy = policy;
                }
            }
        }

        Ok(settings)
    }
}
