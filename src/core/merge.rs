use crate::domain::model::PriceCatalogEntry;

/// Merge `incoming` into a stored group.
///
/// Meter ids are unique within a group: an entry with the same meter id is
/// replaced in place (the newest feed value wins), otherwise `incoming` is
/// appended. Order of the other entries is preserved.
pub fn merge_entry(
    mut existing: Vec<PriceCatalogEntry>,
    incoming: PriceCatalogEntry,
) -> Vec<PriceCatalogEntry> {
    match existing
        .iter_mut()
        .find(|entry| entry.meter_id == incoming.meter_id)
    {
        Some(slot) => *slot = incoming,
        None => existing.push(incoming),
    }
    existing
}
