use crate::core::Pipeline;
use crate::domain::model::SyncReport;
use crate::utils::error::{EstimatorError, Result};
use chrono::Utc;

/// Runs a catalog pipeline end to end: drain, filter, merge.
pub struct SyncEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SyncEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Run one sync and return its report.
    ///
    /// Feed errors abort before anything is written. Per-entry persistence
    /// failures do not stop the run; they are folded into a single
    /// `PartialFailure` once every entry has been attempted.
    pub async fn run(&self) -> Result<SyncReport> {
        let report = self.run_to_report().await?;
        if report.is_success() {
            Ok(report)
        } else {
            Err(EstimatorError::PartialFailure {
                failed: report.failed,
                attempted: report.consumption_items,
            })
        }
    }

    /// Like `run`, but hands back the report even when some entries failed.
    pub async fn run_to_report(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        tracing::info!("Starting catalog sync");

        let listing = self.pipeline.extract().await?;
        let pages_fetched = listing.pages;
        let items_fetched = listing.items.len();
        tracing::info!(pages = pages_fetched, items = items_fetched, "Drained price feed");

        let consumption = self.pipeline.transform(listing.items).await?;
        let consumption_items = consumption.len();
        tracing::info!(count = consumption_items, "Merging consumption prices");

        let outcome = self.pipeline.load(consumption).await?;

        let report = SyncReport {
            pages_fetched,
            items_fetched,
            consumption_items,
            groups_written: outcome.written,
            failed: outcome.failed,
            started_at,
            finished_at: Utc::now(),
        };

        if report.is_success() {
            tracing::info!(written = report.groups_written, "Catalog sync complete");
        } else {
            tracing::error!(
                written = report.groups_written,
                failed = report.failed,
                "Catalog sync finished with failures"
            );
        }
        Ok(report)
    }
}
