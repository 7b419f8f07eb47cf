//! Ranked company views: ranking invariants, view filters and global ranking.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::constants::SOURCE_DATAAXLE;
use crate::domain::{CompanyKey, Row, ScoredTable, SegmentCode, Table};

pub const DEFAULT_SCORING_PATH: &str = "Prospect";

/// A broken ranking invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingViolation {
    #[error("segment {segment}: ranks {actual:?} are not contiguous, expected 1..={expected}")]
    NotContiguous {
        segment: String,
        actual: Vec<Option<i64>>,
        expected: usize,
    },
    #[error("segment {segment}: ranks {actual:?} in score order, expected 1..={expected}")]
    ScoreOrder {
        segment: String,
        actual: Vec<Option<i64>>,
        expected: usize,
    },
}

fn segments(scored: &ScoredTable) -> BTreeMap<Option<SegmentCode>, Vec<Row<'_>>> {
    let mut groups: BTreeMap<Option<SegmentCode>, Vec<Row<'_>>> = BTreeMap::new();
    for row in scored.table.rows() {
        let key = row.get("primary_naics").and_then(SegmentCode::parse);
        groups.entry(key).or_default().push(row);
    }
    groups
}

fn segment_label(segment: &Option<SegmentCode>) -> String {
    segment
        .as_ref()
        .map_or_else(|| "(none)".to_string(), |code| code.to_string())
}

fn expected_ranks(n: usize) -> Vec<Option<i64>> {
    (1..=n as i64).map(Some).collect()
}

/// Ranks within every segment are exactly 1..N.
pub fn validate_segment_rank_contiguity(scored: &ScoredTable) -> Result<(), RankingViolation> {
    let rank_column = scored.rank_column();
    if !scored.table.has_column(rank_column) {
        return Ok(());
    }
    for (segment, rows) in segments(scored) {
        let mut ranks: Vec<Option<i64>> = rows.iter().map(|r| r.get_i64(rank_column)).collect();
        ranks.sort();
        if ranks != expected_ranks(rows.len()) {
            return Err(RankingViolation::NotContiguous {
                segment: segment_label(&segment),
                actual: ranks,
                expected: rows.len(),
            });
        }
    }
    Ok(())
}

/// Within every segment, ordering by score (descending, rank breaking ties) yields ranks 1..N.
pub fn validate_rank_matches_score_order(scored: &ScoredTable) -> Result<(), RankingViolation> {
    let score_column = scored.score_column();
    let rank_column = scored.rank_column();
    if !scored.table.has_column(score_column) || !scored.table.has_column(rank_column) {
        return Ok(());
    }
    for (segment, mut rows) in segments(scored) {
        rows.sort_by(|a, b| {
            descending_nulls_last(a.get_f64(score_column), b.get_f64(score_column))
                .then_with(|| a.get_i64(rank_column).cmp(&b.get_i64(rank_column)))
        });
        let actual: Vec<Option<i64>> = rows.iter().map(|r| r.get_i64(rank_column)).collect();
        if actual != expected_ranks(rows.len()) {
            return Err(RankingViolation::ScoreOrder {
                segment: segment_label(&segment),
                actual,
                expected: rows.len(),
            });
        }
    }
    Ok(())
}

fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Tri-state filter on a boolean column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresenceFilter {
    #[default]
    All,
    With,
    Without,
}

impl PresenceFilter {
    fn admits(self, value: Option<bool>) -> bool {
        match self {
            PresenceFilter::All => true,
            PresenceFilter::With => value == Some(true),
            PresenceFilter::Without => value == Some(false),
        }
    }
}

/// View filters. Each criterion applies only when the table carries its column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetFilter {
    pub segments: Vec<SegmentCode>,
    pub source: Option<String>,
    pub channel: Option<String>,
    pub research: PresenceFilter,
    pub served: PresenceFilter,
}

impl DatasetFilter {
    pub fn apply(&self, table: &Table) -> Table {
        let by_segment = !self.segments.is_empty() && table.has_column("primary_naics");
        let by_source = self.source.is_some() && table.has_column("source");
        let by_channel = self.channel.is_some() && table.has_column("channel_id");
        let by_research = table.has_column("has_research_doc");
        let by_served = table.has_column("is_served");

        table.filter_rows(|row| {
            if by_segment {
                let segment = row.get("primary_naics").and_then(SegmentCode::parse);
                if !segment.is_some_and(|s| self.segments.contains(&s)) {
                    return false;
                }
            }
            if by_source && !same_text(row.get("source"), self.source.as_deref()) {
                return false;
            }
            if by_channel && !same_text(row.get("channel_id"), self.channel.as_deref()) {
                return false;
            }
            if by_research && !self.research.admits(row.get_bool("has_research_doc")) {
                return false;
            }
            if by_served && !self.served.admits(row.get_bool("is_served")) {
                return false;
            }
            true
        })
    }
}

fn same_text(cell: Option<&str>, wanted: Option<&str>) -> bool {
    match (cell, wanted) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// One row of the ranked companies view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCompany {
    pub global_rank: usize,
    pub segment_rank: Option<i64>,
    pub company_id: String,
    pub company_name: Option<String>,
    pub segment: Option<SegmentCode>,
    pub scoring_path: String,
    pub channel: Option<String>,
    pub score: Option<f64>,
    pub penetration_rate: Option<f64>,
    pub building_count: i64,
    pub source: String,
    pub has_research: Option<bool>,
}

/// All scored companies ordered by score descending, with a global rank.
pub fn ranked_view(scored: &ScoredTable, penetration: Option<&Table>) -> Vec<RankedCompany> {
    let score_column = scored.score_column();
    let rank_column = scored.rank_column();

    let penetration: HashMap<CompanyKey, f64> = penetration
        .map(|table| {
            table
                .rows()
                .filter_map(|row| {
                    Some((
                        CompanyKey::new(row.get("company_id")?),
                        row.get_f64("penetration_rate")?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut rows: Vec<Row<'_>> = scored.table.rows().collect();
    rows.sort_by(|a, b| descending_nulls_last(a.get_f64(score_column), b.get_f64(score_column)));

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let company_id = row.get("company_id").unwrap_or_default().to_string();
            RankedCompany {
                global_rank: i + 1,
                segment_rank: row.get_i64(rank_column),
                penetration_rate: penetration.get(&CompanyKey::new(&company_id)).copied(),
                company_id,
                company_name: row.get("company_name").map(str::to_string),
                segment: row.get("primary_naics").and_then(SegmentCode::parse),
                scoring_path: row
                    .get("scoring_path")
                    .unwrap_or(DEFAULT_SCORING_PATH)
                    .to_string(),
                channel: row.get("channel_id").map(str::to_string),
                score: row.get_f64(score_column),
                building_count: row.get_i64("building_count").unwrap_or(0),
                source: row.get("source").unwrap_or(SOURCE_DATAAXLE).to_string(),
                has_research: row.get_bool("has_research_doc"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScoringVariant;
    use crate::pipeline::processing::rerank::rerank_segments;

    fn legacy(rows: &[(&str, &str, &str, &str, &str)]) -> ScoredTable {
        let table = Table::from_rows(
            "scored_companies.csv",
            vec![
                "company_id".into(),
                "primary_naics".into(),
                "augmented_score".into(),
                "segment_rank".into(),
                "source".into(),
            ],
            rows.iter()
                .map(|(id, naics, score, rank, source)| {
                    [id, naics, score, rank, source]
                        .iter()
                        .map(|v| Some(v.to_string()))
                        .collect()
                })
                .collect(),
        );
        ScoredTable::new(ScoringVariant::Legacy, table)
    }

    #[test]
    fn test_reranked_output_satisfies_both_invariants() {
        let scored = legacy(&[
            ("1", "44", "0.2", "7", "dataaxle"),
            ("2", "44", "0.9", "2", "manual"),
            ("3", "61", "0.5", "1", "dataaxle"),
        ]);
        assert!(validate_segment_rank_contiguity(&scored).is_err());

        let reranked = rerank_segments(&scored);
        assert_eq!(validate_segment_rank_contiguity(&reranked), Ok(()));
        assert_eq!(validate_rank_matches_score_order(&reranked), Ok(()));
    }

    #[test]
    fn test_score_order_violation_names_segment() {
        let scored = legacy(&[
            ("1", "44", "0.2", "1", "dataaxle"),
            ("2", "44", "0.9", "2", "dataaxle"),
        ]);
        assert_eq!(validate_segment_rank_contiguity(&scored), Ok(()));
        let err = validate_rank_matches_score_order(&scored).unwrap_err();
        assert!(err.to_string().starts_with("segment 44"));
    }

    #[test]
    fn test_filters_leave_input_untouched() {
        let scored = legacy(&[
            ("1", "44", "0.2", "1", "dataaxle"),
            ("2", "44", "0.9", "2", "Manual"),
            ("3", "61", "0.5", "1", "manual"),
        ]);
        let filter = DatasetFilter {
            segments: vec![SegmentCode::Numeric(44)],
            source: Some("manual".into()),
            ..DatasetFilter::default()
        };
        let filtered = filter.apply(&scored.table);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.row(0).unwrap().get("company_id"), Some("2"));
        assert_eq!(scored.table.len(), 3);
    }

    #[test]
    fn test_research_filter_needs_its_column() {
        let table = Table::from_rows(
            "scored",
            vec!["company_id".into(), "has_research_doc".into()],
            vec![
                vec![Some("1".into()), Some("True".into())],
                vec![Some("2".into()), Some("False".into())],
            ],
        );
        let with = DatasetFilter {
            research: PresenceFilter::With,
            ..DatasetFilter::default()
        };
        assert_eq!(with.apply(&table).len(), 1);

        let other = Table::from_rows("x", vec!["company_id".into()], vec![vec![Some("1".into())]]);
        assert_eq!(with.apply(&other).len(), 1);
    }

    #[test]
    fn test_ranked_view_orders_globally_by_score() {
        let scored = legacy(&[
            ("1", "44", "0.2", "1", "dataaxle"),
            ("2", "61", "0.9", "1", "manual"),
            ("3", "44", "", "2", "dataaxle"),
        ]);
        let penetration = Table::from_rows(
            "penetration_by_company.csv",
            vec!["company_id".into(), "penetration_rate".into()],
            vec![vec![Some("002".into()), Some("0.5".into())]],
        );
        let view = ranked_view(&scored, Some(&penetration));
        let ids: Vec<&str> = view.iter().map(|r| r.company_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(view[0].global_rank, 1);
        assert_eq!(view[0].penetration_rate, Some(0.5));
        assert_eq!(view[0].scoring_path, DEFAULT_SCORING_PATH);
        assert_eq!(view[2].score, None);
    }
}
