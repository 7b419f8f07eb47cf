use tracing::error;

use crate::domain::Table;
use crate::error::{DashboardError, Result};

/// Check that `table` carries every column in `required`.
///
/// The error lists missing and present columns, both sorted, so the operator can
/// see what the upstream stage actually wrote.
pub fn validate_schema(table: &Table, required: &[&str], artifact: &str) -> Result<()> {
    let mut missing: Vec<String> = required
        .iter()
        .filter(|column| !table.has_column(column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    missing.sort();
    missing.dedup();
    let mut present = table.columns().to_vec();
    present.sort();

    error!(
        artifact = artifact,
        missing = ?missing,
        "Schema validation failed"
    );
    Err(DashboardError::SchemaViolation {
        artifact: artifact.to_string(),
        missing,
        present,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str]) -> Table {
        Table::new("companies.csv", columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_schema_passes_with_extra_columns() {
        let companies = table(&["company_id", "name", "extra"]);
        assert!(validate_schema(&companies, &["company_id", "name"], "companies.csv").is_ok());
    }

    #[test]
    fn test_schema_violation_lists_sorted_columns() {
        let companies = table(&["zip", "company_id"]);
        let err = validate_schema(
            &companies,
            &["primary_naics", "company_id", "name"],
            "companies.csv",
        )
        .unwrap_err();
        match err {
            DashboardError::SchemaViolation {
                artifact,
                missing,
                present,
            } => {
                assert_eq!(artifact, "companies.csv");
                assert_eq!(missing, vec!["name", "primary_naics"]);
                assert_eq!(present, vec!["company_id", "zip"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
