use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::{ScoredTable, SegmentCode};
use crate::observability::metrics;

/// Partition key. Rows without a segment form their own partition, ordered last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SegmentKey {
    Code(SegmentCode),
    Missing,
}

struct RankInput {
    position: usize,
    score: Option<f64>,
    prior_rank: Option<f64>,
}

/// Recompute contiguous 1..N ranks within each `primary_naics` segment.
///
/// Within a segment rows are ordered by score descending, then by their prior rank,
/// then by input position; missing scores and ranks go last. The output is sorted
/// by segment ascending then by the new rank. Applying it twice changes nothing.
pub fn rerank_segments(scored: &ScoredTable) -> ScoredTable {
    let table = &scored.table;
    let score_column = scored.score_column();
    let rank_column = scored.rank_column();

    let mut partitions: BTreeMap<SegmentKey, Vec<RankInput>> = BTreeMap::new();
    for row in table.rows() {
        let key = row
            .get("primary_naics")
            .and_then(SegmentCode::parse)
            .map_or(SegmentKey::Missing, SegmentKey::Code);
        partitions.entry(key).or_default().push(RankInput {
            position: row.index(),
            score: row.get_f64(score_column),
            prior_rank: row.get_f64(rank_column),
        });
    }

    let mut order = Vec::with_capacity(table.len());
    let mut ranks = Vec::with_capacity(table.len());
    for members in partitions.values_mut() {
        members.sort_by(compare_within_segment);
        for (rank, member) in members.iter().enumerate() {
            order.push(member.position);
            ranks.push(Some((rank + 1).to_string()));
        }
    }

    let reranked = table.reorder(&order).with_column(rank_column, ranks);
    info!(
        rows = reranked.len(),
        segments = partitions.len(),
        rank_column = rank_column,
        "Re-ranked companies within segments"
    );
    metrics::ranking::reranked(partitions.len(), reranked.len());
    scored.with_table(reranked)
}

fn compare_within_segment(a: &RankInput, b: &RankInput) -> Ordering {
    // Higher score first
    nulls_last(a.score, b.score, |x, y| y.total_cmp(&x))
        .then_with(|| nulls_last(a.prior_rank, b.prior_rank, |x, y| x.total_cmp(&y)))
        .then_with(|| a.position.cmp(&b.position))
}

fn nulls_last(a: Option<f64>, b: Option<f64>, cmp: impl Fn(f64, f64) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScoringVariant, Table};

    fn current(rows: &[(&str, Option<&str>, Option<&str>, Option<&str>)]) -> ScoredTable {
        let table = Table::from_rows(
            "scored_companies_final.csv",
            vec![
                "company_id".into(),
                "primary_naics".into(),
                "final_score".into(),
                "rank".into(),
                "scoring_path".into(),
            ],
            rows.iter()
                .map(|(id, naics, score, rank)| {
                    vec![
                        Some(id.to_string()),
                        naics.map(str::to_string),
                        score.map(str::to_string),
                        rank.map(str::to_string),
                        Some("Prospect".into()),
                    ]
                })
                .collect(),
        );
        ScoredTable::new(ScoringVariant::Current, table)
    }

    fn ids_and_ranks(scored: &ScoredTable) -> Vec<(String, String)> {
        scored
            .table
            .rows()
            .map(|r| {
                (
                    r.get("company_id").unwrap().to_string(),
                    r.get("rank").unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_gaps_are_closed_within_segment() {
        let scored = current(&[
            ("C1", Some("44"), Some("80"), Some("1")),
            ("C2", Some("44"), Some("90"), Some("3")),
        ]);
        let reranked = rerank_segments(&scored);
        assert_eq!(
            ids_and_ranks(&reranked),
            vec![("C2".into(), "1".into()), ("C1".into(), "2".into())]
        );
    }

    #[test]
    fn test_segments_sorted_numerically_and_nulls_last() {
        let scored = current(&[
            ("Z", None, Some("99"), None),
            ("B", Some("100"), Some("50"), None),
            ("A", Some("44.0"), Some("10"), None),
            ("C", Some("100"), None, None),
            ("D", Some("100"), Some("70"), None),
        ]);
        let reranked = rerank_segments(&scored);
        let ids: Vec<String> = ids_and_ranks(&reranked).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["A", "D", "B", "C", "Z"]);
        let ranks: Vec<String> = ids_and_ranks(&reranked).into_iter().map(|(_, r)| r).collect();
        assert_eq!(ranks, vec!["1", "1", "2", "3", "1"]);
    }

    #[test]
    fn test_score_ties_break_on_prior_rank_then_position() {
        let scored = current(&[
            ("first", Some("1"), Some("5"), None),
            ("second", Some("1"), Some("5"), Some("2")),
            ("third", Some("1"), Some("5"), Some("1")),
            ("fourth", Some("1"), Some("5"), None),
        ]);
        let ids: Vec<String> = ids_and_ranks(&rerank_segments(&scored))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["third", "second", "first", "fourth"]);
    }

    #[test]
    fn test_rerank_is_a_fixed_point() {
        let scored = current(&[
            ("C1", Some("2"), Some("1"), Some("9")),
            ("C2", Some("1"), Some("3"), Some("4")),
            ("C3", Some("1"), Some("7"), Some("4")),
        ]);
        let once = rerank_segments(&scored);
        let twice = rerank_segments(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_rank_column_is_created() {
        let table = Table::from_rows(
            "scored",
            vec!["company_id".into(), "primary_naics".into(), "final_score".into()],
            vec![
                vec![Some("a".into()), Some("1".into()), Some("1".into())],
                vec![Some("b".into()), Some("1".into()), Some("2".into())],
            ],
        );
        let reranked = rerank_segments(&ScoredTable::new(ScoringVariant::Current, table));
        assert_eq!(
            ids_and_ranks(&reranked),
            vec![("b".into(), "1".into()), ("a".into(), "2".into())]
        );
    }

    #[test]
    fn test_legacy_variant_uses_its_own_columns() {
        let table = Table::from_rows(
            "scored_companies.csv",
            vec![
                "company_id".into(),
                "primary_naics".into(),
                "augmented_score".into(),
                "segment_rank".into(),
            ],
            vec![
                vec![Some("a".into()), Some("7".into()), Some("0.2".into()), Some("1".into())],
                vec![Some("b".into()), Some("7".into()), Some("0.9".into()), Some("5".into())],
            ],
        );
        let reranked = rerank_segments(&ScoredTable::new(ScoringVariant::Legacy, table));
        let first = reranked.table.row(0).unwrap();
        assert_eq!(first.get("company_id"), Some("b"));
        assert_eq!(first.get("segment_rank"), Some("1"));
        assert!(!reranked.table.has_column("rank"));
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let scored = current(&[]);
        assert!(rerank_segments(&scored).table.is_empty());
    }
}
