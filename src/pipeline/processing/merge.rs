use std::collections::HashMap;
use tracing::warn;

use crate::domain::{CompanyKey, Table};

/// Attach each scored company's `building_count` from the companies artifact.
///
/// Left join on the normalized company key; companies with no count get `0`.
/// An existing `building_count` column on the scored table is replaced.
pub fn merge_building_count(scored: &Table, companies: &Table) -> Table {
    let companies = companies.with_alias("building_count_estimate", "building_count");
    if !companies.has_column("building_count") {
        warn!("Companies artifact has no building_count; defaulting to 0");
    }

    let mut counts: HashMap<CompanyKey, i64> = HashMap::new();
    for row in companies.rows() {
        if let (Some(id), Some(count)) = (row.get("company_id"), row.get_i64("building_count")) {
            counts.entry(CompanyKey::new(id)).or_insert(count);
        }
    }

    scored.map_column("building_count", |row| {
        let count = row
            .get("company_id")
            .and_then(|id| counts.get(&CompanyKey::new(id)))
            .copied()
            .unwrap_or(0);
        Some(count.to_string())
    })
}
