use serde::Serialize;
use std::fmt;

use super::table::Table;

const CORE_COLUMNS: [&str; 3] = ["company_id", "company_name", "primary_naics"];

/// The two scoring schema generations produced by the scoring stage.
///
/// Every column-name decision downstream is a function of this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringVariant {
    /// `segment_rank`, `standard_score`, `augmented_score`, `icp_fit_score`, ...
    Legacy,
    /// `rank`, `final_score`, `naics_attractiveness_score`, `company_opportunity_score`, ...
    Current,
}

impl ScoringVariant {
    /// The current schema is recognized by `final_score` together with `scoring_path`.
    pub fn detect(table: &Table) -> Self {
        if table.has_column("final_score") && table.has_column("scoring_path") {
            ScoringVariant::Current
        } else {
            ScoringVariant::Legacy
        }
    }

    pub fn required_columns(self) -> Vec<&'static str> {
        let extra: &[&str] = match self {
            ScoringVariant::Current => &[
                "final_score",
                "naics_attractiveness_score",
                "company_opportunity_score",
                "scoring_path",
                "is_customer",
            ],
            ScoringVariant::Legacy => &[
                "source",
                "channel_id",
                "standard_score",
                "augmented_score",
                "augmented_confidence",
                "segment_rank",
                "icp_fit_score",
                "urgent_flags",
                "action_flags",
                "has_research_doc",
            ],
        };
        CORE_COLUMNS.iter().chain(extra).copied().collect()
    }

    /// Fields that must be at least 99% populated for the dashboard to start.
    pub fn critical_fields(self) -> [&'static str; 6] {
        match self {
            ScoringVariant::Current => [
                "company_id",
                "company_name",
                "rank",
                "final_score",
                "naics_attractiveness_score",
                "company_opportunity_score",
            ],
            ScoringVariant::Legacy => [
                "company_id",
                "company_name",
                "segment_rank",
                "standard_score",
                "augmented_score",
                "icp_fit_score",
            ],
        }
    }

    pub fn score_column(self) -> &'static str {
        match self {
            ScoringVariant::Current => "final_score",
            ScoringVariant::Legacy => "augmented_score",
        }
    }

    pub fn rank_column(self) -> &'static str {
        match self {
            ScoringVariant::Current => "rank",
            ScoringVariant::Legacy => "segment_rank",
        }
    }
}

impl fmt::Display for ScoringVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringVariant::Legacy => write!(f, "legacy"),
            ScoringVariant::Current => write!(f, "current"),
        }
    }
}

/// Scored-companies dataset tagged with its schema variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTable {
    pub variant: ScoringVariant,
    pub table: Table,
}

impl ScoredTable {
    pub fn new(variant: ScoringVariant, table: Table) -> Self {
        Self { variant, table }
    }

    /// Same variant, different rows.
    pub fn with_table(&self, table: Table) -> Self {
        Self {
            variant: self.variant,
            table,
        }
    }

    pub fn score_column(&self) -> &'static str {
        self.variant.score_column()
    }

    pub fn rank_column(&self) -> &'static str {
        self.variant.rank_column()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(columns: &[&str]) -> Table {
        Table::new("scored", columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_detect_requires_both_marker_columns() {
        assert_eq!(
            ScoringVariant::detect(&table_with(&["final_score", "scoring_path"])),
            ScoringVariant::Current
        );
        assert_eq!(
            ScoringVariant::detect(&table_with(&["final_score"])),
            ScoringVariant::Legacy
        );
        assert_eq!(
            ScoringVariant::detect(&table_with(&["augmented_score", "segment_rank"])),
            ScoringVariant::Legacy
        );
    }

    #[test]
    fn test_column_selection_follows_variant() {
        assert_eq!(ScoringVariant::Current.score_column(), "final_score");
        assert_eq!(ScoringVariant::Current.rank_column(), "rank");
        assert_eq!(ScoringVariant::Legacy.score_column(), "augmented_score");
        assert_eq!(ScoringVariant::Legacy.rank_column(), "segment_rank");
    }

    #[test]
    fn test_required_columns_share_core() {
        for variant in [ScoringVariant::Current, ScoringVariant::Legacy] {
            let required = variant.required_columns();
            for core in CORE_COLUMNS {
                assert!(required.contains(&core));
            }
        }
        assert!(!ScoringVariant::Current.required_columns().contains(&"segment_rank"));
    }
}
