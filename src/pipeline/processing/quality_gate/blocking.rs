use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::constants::LOG_SAMPLE_SIZE;
use crate::domain::{CompanyKey, ScoredTable, Table};
use crate::pipeline::processing::referential::CompanyIndex;

/// Every critical field of the scoring variant must be at least `min` populated.
pub fn check_critical_completeness(scored: &ScoredTable, min: f64) -> Result<(), String> {
    let table = &scored.table;
    for field in scored.variant.critical_fields() {
        let Some(fraction) = table.non_null_fraction(field) else {
            return Err(format!(
                "critical field '{}' is missing from {}",
                field,
                table.name()
            ));
        };
        if fraction < min {
            return Err(format!(
                "critical field '{}' is {:.1}% complete, below the {:.1}% threshold",
                field,
                fraction * 100.0,
                min * 100.0
            ));
        }
    }
    Ok(())
}

/// `company_id` unique among scored companies, `building_id` unique among buildings.
pub fn check_uniqueness(scored: &Table, buildings: &Table) -> Result<(), String> {
    let companies = duplicates(scored, "company_id", CompanyKey::new);
    if companies.rows > 0 {
        return Err(format!(
            "{} rows share a duplicated company_id in {} (e.g. {:?})",
            companies.rows,
            scored.name(),
            companies.sample
        ));
    }

    let buildings_dup = duplicates(buildings, "building_id", |id| id.trim().to_string());
    if buildings_dup.rows > 0 {
        return Err(format!(
            "{} rows share a duplicated building_id in {} (e.g. {:?})",
            buildings_dup.rows,
            buildings.name(),
            buildings_dup.sample
        ));
    }
    Ok(())
}

/// Every scored company and every building must reference a known company.
pub fn check_join_integrity(scored: &Table, companies: &Table, buildings: &Table) -> Result<(), String> {
    let index = CompanyIndex::from_companies(companies);

    for dependent in [scored, buildings] {
        let unknown = unknown_companies(dependent, &index);
        if !unknown.is_empty() {
            let sample: Vec<&String> = unknown.iter().take(LOG_SAMPLE_SIZE).collect();
            return Err(format!(
                "{} company_id values in {} have no match in {} (e.g. {:?})",
                unknown.len(),
                dependent.name(),
                companies.name(),
                sample
            ));
        }
    }
    Ok(())
}

struct Duplicates {
    /// Rows involved in any duplication
    rows: usize,
    sample: Vec<String>,
}

fn duplicates<K, F>(table: &Table, column: &str, key: F) -> Duplicates
where
    K: Eq + Hash,
    F: Fn(&str) -> K,
{
    let mut groups: HashMap<K, (usize, &str)> = HashMap::new();
    for raw in table.column(column).unwrap_or_default().into_iter().flatten() {
        groups.entry(key(raw)).or_insert((0, raw)).0 += 1;
    }

    let mut repeated: Vec<(usize, &str)> = groups.into_values().filter(|(n, _)| *n > 1).collect();
    repeated.sort_by(|a, b| a.1.cmp(b.1));
    Duplicates {
        rows: repeated.iter().map(|(n, _)| n).sum(),
        sample: repeated
            .iter()
            .take(LOG_SAMPLE_SIZE)
            .map(|(_, id)| id.to_string())
            .collect(),
    }
}

fn unknown_companies(dependent: &Table, index: &CompanyIndex) -> BTreeSet<String> {
    dependent
        .column("company_id")
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|id| !index.contains(id))
        .map(str::to_string)
        .collect()
}
