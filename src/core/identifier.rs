use crate::domain::model::PriceCatalogEntry;

const PREFIX: &str = "azure";

/// Storage key of the group an entry belongs to.
///
/// Shape: `azure:<service>:<region>:<sku>`. Meter id, price and dates are not
/// part of the key, so a refreshed meter lands in the group it was stored in.
pub fn derive_identifier(entry: &PriceCatalogEntry) -> String {
    let sku = match entry.arm_sku_name.as_deref().map(str::trim) {
        Some(arm_sku) if !arm_sku.is_empty() => normalize(arm_sku),
        _ => format!(
            "{}/{}",
            normalize(&entry.product_name),
            normalize(&entry.sku_name)
        ),
    };
    assemble(&entry.service_name, &entry.arm_region_name, &sku)
}

/// Identifier for a service/region/sku triple, e.g. the catalog group of a
/// VM size in one region.
pub fn group_identifier(service: &str, region: &str, sku: &str) -> String {
    assemble(service, region, &normalize(sku))
}

fn assemble(service: &str, region: &str, sku: &str) -> String {
    let region = normalize(region);
    let region = if region.is_empty() {
        "global".to_string()
    } else {
        region
    };
    format!("{}:{}:{}:{}", PREFIX, normalize(service), region, sku)
}

/// Lowercase, with each whitespace run turned into `-`.
///
/// Characters that carry meaning in the key are escaped (`-`, `%`, `:`, `/`),
/// so "Foo Bar" and "Foo-Bar" stay distinct.
fn normalize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for (i, word) in part.split_whitespace().enumerate() {
        if i > 0 {
            out.push('-');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            match c {
                '-' => out.push_str("%2d"),
                '%' => out.push_str("%25"),
                ':' => out.push_str("%3a"),
                '/' => out.push_str("%2f"),
                c => out.push(c),
            }
        }
    }
    out
}
