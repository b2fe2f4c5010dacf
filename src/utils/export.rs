use crate::domain::model::PriceCatalogEntry;
use crate::utils::error::{EstimatorError, Result};
use serde::Serialize;

#[derive(Serialize)]
struct CsvRow<'a> {
    meter_id: &'a str,
    price_type: &'a str,
    service_name: &'a str,
    product_name: &'a str,
    sku_name: &'a str,
    arm_sku_name: &'a str,
    arm_region_name: &'a str,
    unit_of_measure: &'a str,
    retail_price: f64,
    currency_code: &'a str,
    effective_start_date: &'a str,
}

impl<'a> From<&'a PriceCatalogEntry> for CsvRow<'a> {
    fn from(e: &'a PriceCatalogEntry) -> Self {
        Self {
            meter_id: &e.meter_id,
            price_type: &e.price_type,
            service_name: &e.service_name,
            product_name: &e.product_name,
            sku_name: &e.sku_name,
            arm_sku_name: e.arm_sku_name.as_deref().unwrap_or(""),
            arm_region_name: &e.arm_region_name,
            unit_of_measure: &e.unit_of_measure,
            retail_price: e.retail_price,
            currency_code: &e.currency_code,
            effective_start_date: &e.effective_start_date,
        }
    }
}

/// Flatten a listing to CSV, one row per entry, with a header row.
pub fn write_listing_csv(items: &[PriceCatalogEntry]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for item in items {
        writer.serialize(CsvRow::from(item))?;
    }
    writer
        .into_inner()
        .map_err(|e| EstimatorError::IoError(e.into_error()))
}
