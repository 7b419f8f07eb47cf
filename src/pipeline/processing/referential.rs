use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::constants::LOG_SAMPLE_SIZE;
use crate::domain::{CompanyKey, Table};
use crate::observability::metrics;

/// Set of known companies, keyed by normalized identifier.
#[derive(Debug, Clone, Default)]
pub struct CompanyIndex {
    keys: HashSet<CompanyKey>,
}

impl CompanyIndex {
    pub fn from_companies(companies: &Table) -> Self {
        let keys = companies
            .rows()
            .filter_map(|row| row.get("company_id"))
            .map(CompanyKey::new)
            .collect();
        Self { keys }
    }

    pub fn contains(&self, company_id: &str) -> bool {
        self.keys.contains(&CompanyKey::new(company_id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Drop rows whose `company_id` is not a known company.
///
/// Rows with a null `company_id` count as orphans. A table without a
/// `company_id` column has nothing to join on and is returned unchanged.
pub fn filter_orphans(dependent: &Table, companies: &CompanyIndex) -> Table {
    if !dependent.has_column("company_id") {
        debug!(artifact = dependent.name(), "No company_id column; skipping orphan filter");
        return dependent.clone();
    }
    if companies.is_empty() {
        warn!(artifact = dependent.name(), "No known companies; every row is an orphan");
    } else {
        debug!(
            artifact = dependent.name(),
            known_companies = companies.len(),
            "Filtering orphaned rows"
        );
    }

    let mut orphan_ids: BTreeSet<String> = BTreeSet::new();
    let kept = dependent.filter_rows(|row| match row.get("company_id") {
        Some(id) if companies.contains(id) => true,
        Some(id) => {
            orphan_ids.insert(id.to_string());
            false
        }
        None => false,
    });

    let removed = dependent.len() - kept.len();
    if removed > 0 {
        let sample: Vec<&String> = orphan_ids.iter().take(LOG_SAMPLE_SIZE).collect();
        warn!(
            artifact = dependent.name(),
            removed = removed,
            distinct_companies = orphan_ids.len(),
            sample = ?sample,
            "Filtered orphaned rows referencing unknown companies"
        );
        metrics::filter::orphans_removed(dependent.name(), removed);
    }
    kept
}
