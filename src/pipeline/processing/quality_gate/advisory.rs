use tracing::debug;

use super::{AdvisoryGate, AdvisoryResult};
use crate::constants::MATCH_TYPE_UNMATCHED;
use crate::domain::{BuildingRecord, Table};
use crate::pipeline::ingestion::artifacts::{DIAGNOSTICS_ARTIFACT, ENTITY_RESOLUTION_ARTIFACT};
use crate::pipeline::ingestion::formats::{read_json, read_table};
use crate::pipeline::paths::DataRoot;

/// Share of entity-resolution attempts left unmatched must stay below `max_rate`.
///
/// A missing or unreadable log, or one without `match_type`, passes with rate 0.
pub fn assess_entity_resolution(root: &DataRoot, max_rate: f64) -> AdvisoryResult {
    let gate = AdvisoryGate::EntityResolution;
    let Some(path) = ENTITY_RESOLUTION_ARTIFACT.resolve(root) else {
        debug!("No entity resolution log; treating unmatched rate as 0");
        return AdvisoryResult::pass(gate, 0.0);
    };
    let log = match read_table(&path, ENTITY_RESOLUTION_ARTIFACT.stage) {
        Ok(log) => log,
        Err(e) => {
            debug!(error = %e, "Entity resolution log unreadable; treating unmatched rate as 0");
            return AdvisoryResult::pass(gate, 0.0);
        }
    };
    let Some(match_types) = log.column("match_type") else {
        return AdvisoryResult::pass(gate, 0.0);
    };
    if match_types.is_empty() {
        return AdvisoryResult::pass(gate, 0.0);
    }

    let unmatched = match_types
        .iter()
        .filter(|t| t.map(str::trim) == Some(MATCH_TYPE_UNMATCHED))
        .count();
    let rate = unmatched as f64 / match_types.len() as f64;
    if rate < max_rate {
        AdvisoryResult::pass(gate, rate)
    } else {
        AdvisoryResult::fail(
            gate,
            Some(rate),
            format!(
                "{:.1}% of entity resolution attempts unmatched (threshold {:.1}%)",
                rate * 100.0,
                max_rate * 100.0
            ),
        )
    }
}

/// Scoring weights recorded in the diagnostics must sum to 1 within `tolerance`.
pub fn assess_scoring_weights(root: &DataRoot, tolerance: f64) -> AdvisoryResult {
    let gate = AdvisoryGate::ScoringWeights;
    let Some(path) = DIAGNOSTICS_ARTIFACT.resolve(root) else {
        return AdvisoryResult::fail(
            gate,
            None,
            format!(
                "scoring diagnostics not found at {}",
                DIAGNOSTICS_ARTIFACT.expected_path(root).display()
            ),
        );
    };
    let diagnostics: serde_json::Value = match read_json(&path, DIAGNOSTICS_ARTIFACT.stage) {
        Ok(value) => value,
        Err(e) => return AdvisoryResult::fail(gate, None, e.to_string()),
    };
    let Some(sum) = diagnostics
        .pointer("/weight_validation/sum")
        .and_then(serde_json::Value::as_f64)
    else {
        return AdvisoryResult::fail(gate, None, "weight_validation.sum missing from diagnostics");
    };

    if (sum - 1.0).abs() <= tolerance {
        AdvisoryResult::pass(gate, sum)
    } else {
        AdvisoryResult::fail(
            gate,
            Some(sum),
            format!("scoring weights sum to {:.4}, expected 1.0 ± {}", sum, tolerance),
        )
    }
}

/// Fraction of buildings with both coordinates must be at least `min`.
pub fn assess_coordinate_coverage(buildings: &Table, min: f64) -> AdvisoryResult {
    let gate = AdvisoryGate::CoordinateCoverage;
    let located = buildings
        .rows()
        .filter(|row| BuildingRecord::from_row(row).has_coordinates())
        .count();
    let coverage = ratio(located, buildings.len());

    if coverage >= min {
        AdvisoryResult::pass(gate, coverage)
    } else {
        AdvisoryResult::fail(
            gate,
            Some(coverage),
            format!(
                "{:.1}% of buildings have coordinates (threshold {:.1}%)",
                coverage * 100.0,
                min * 100.0
            ),
        )
    }
}

/// Fraction of scored companies flagged `has_research_doc` must be at least `min`.
pub fn assess_research_coverage(scored: &Table, min: f64) -> AdvisoryResult {
    let gate = AdvisoryGate::ResearchCoverage;
    if !scored.has_column("has_research_doc") {
        return AdvisoryResult::fail(gate, None, "has_research_doc column missing from scored companies");
    }
    let researched = scored
        .rows()
        .filter(|row| row.get_bool("has_research_doc") == Some(true))
        .count();
    let coverage = ratio(researched, scored.len());

    if coverage >= min {
        AdvisoryResult::pass(gate, coverage)
    } else {
        AdvisoryResult::fail(
            gate,
            Some(coverage),
            format!(
                "{:.1}% of scored companies have research (threshold {:.1}%)",
                coverage * 100.0,
                min * 100.0
            ),
        )
    }
}

/// Empty inputs count as zero coverage.
fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
