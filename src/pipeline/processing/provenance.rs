use tracing::{info, warn};

use crate::constants::{is_served_source, SOURCE_DATAAXLE};
use crate::domain::Table;

/// Fill in building provenance columns older reconciliation runs did not write.
///
/// * `source` defaults to the bulk-data provider when the column or a cell is missing.
/// * `is_served` is derived from `source` when the column is absent.
/// * `square_footage` is taken from `square_footage_code`, else added as nulls.
pub fn derive_building_provenance(buildings: &Table) -> Table {
    let mut table = buildings.clone();

    if !table.has_column("source") {
        warn!(
            artifact = table.name(),
            default = SOURCE_DATAAXLE,
            "Buildings have no source column; defaulting every row"
        );
    }
    let missing_sources = table
        .column("source")
        .map(|values| values.iter().filter(|v| v.is_none()).count())
        .unwrap_or(table.len());
    if missing_sources > 0 || !table.has_column("source") {
        table = table.map_column("source", |row| {
            Some(row.get("source").unwrap_or(SOURCE_DATAAXLE).to_string())
        });
    }

    if !table.has_column("is_served") {
        table = table.map_column("is_served", |row| {
            let served = row.get("source").map(is_served_source).unwrap_or(false);
            Some(served.to_string())
        });
        let served = table
            .rows()
            .filter(|row| row.get_bool("is_served") == Some(true))
            .count();
        info!(
            served = served,
            total = table.len(),
            "Derived is_served from building source"
        );
    }

    if !table.has_column("square_footage") {
        table = if table.has_column("square_footage_code") {
            table.with_alias("square_footage_code", "square_footage")
        } else {
            let nulls = vec![None; table.len()];
            table.with_column("square_footage", nulls)
        };
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buildings(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Table {
        Table::from_rows(
            "golden_buildings.csv",
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_missing_source_column_defaults_and_is_unserved() {
        let table = buildings(&["building_id", "company_id"], vec![vec![Some("B1"), Some("1")]]);
        let derived = derive_building_provenance(&table);
        let row = derived.row(0).unwrap();
        assert_eq!(row.get("source"), Some(SOURCE_DATAAXLE));
        assert_eq!(row.get_bool("is_served"), Some(false));
        assert!(derived.has_column("square_footage"));
        assert_eq!(row.get("square_footage"), None);
    }

    #[test]
    fn test_served_is_derived_case_insensitively() {
        let table = buildings(
            &["building_id", "company_id", "source"],
            vec![
                vec![Some("B1"), Some("1"), Some("HubSpot")],
                vec![Some("B2"), Some("1"), Some("MANUAL")],
                vec![Some("B3"), Some("1"), None],
            ],
        );
        let derived = derive_building_provenance(&table);
        let served: Vec<Option<bool>> = derived.rows().map(|r| r.get_bool("is_served")).collect();
        assert_eq!(served, vec![Some(true), Some(true), Some(false)]);
        assert_eq!(derived.row(2).unwrap().get("source"), Some(SOURCE_DATAAXLE));
    }

    #[test]
    fn test_existing_served_flag_is_kept() {
        let table = buildings(
            &["building_id", "company_id", "source", "is_served"],
            vec![vec![Some("B1"), Some("1"), Some("dataaxle"), Some("True")]],
        );
        let derived = derive_building_provenance(&table);
        assert_eq!(derived.row(0).unwrap().get_bool("is_served"), Some(true));
    }

    #[test]
    fn test_square_footage_aliases_code_column() {
        let table = buildings(
            &["building_id", "company_id", "square_footage_code"],
            vec![vec![Some("B1"), Some("1"), Some("12000")]],
        );
        let derived = derive_building_provenance(&table);
        assert_eq!(derived.row(0).unwrap().get_f64("square_footage"), Some(12000.0));
    }
}
