//! Startup quality gates over the loaded datasets.
//!
//! Blocking gates run first, in a fixed order, and the first failure aborts with a
//! [`DashboardError::QualityGate`]. Non-blocking gates always run afterwards and
//! only contribute warnings to the report.

pub mod advisory;
pub mod blocking;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::domain::{ScoredTable, Table};
use crate::error::{DashboardError, Result};
use crate::observability::metrics;
use crate::pipeline::paths::DataRoot;

/// Thresholds for every gate
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QualityGateConfig {
    /// Minimum non-null fraction for each critical scoring field
    pub critical_completeness_min: f64,
    /// Entity resolution unmatched rate must stay strictly below this
    pub max_unmatched_rate: f64,
    /// Allowed distance of the scoring weight sum from 1.0
    pub weight_sum_tolerance: f64,
    /// Minimum fraction of buildings with both coordinates
    pub min_coordinate_coverage: f64,
    /// Minimum fraction of scored companies with a research document
    pub min_research_coverage: f64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            critical_completeness_min: 0.99,
            max_unmatched_rate: 0.10,
            weight_sum_tolerance: 0.001,
            min_coordinate_coverage: 0.80,
            min_research_coverage: 0.70,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingGate {
    CriticalFieldCompleteness,
    Uniqueness,
    JoinIntegrity,
}

impl BlockingGate {
    /// Evaluation order
    pub const ORDER: [BlockingGate; 3] = [
        BlockingGate::CriticalFieldCompleteness,
        BlockingGate::Uniqueness,
        BlockingGate::JoinIntegrity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockingGate::CriticalFieldCompleteness => "critical_field_completeness",
            BlockingGate::Uniqueness => "uniqueness",
            BlockingGate::JoinIntegrity => "join_integrity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryGate {
    EntityResolution,
    ScoringWeights,
    CoordinateCoverage,
    ResearchCoverage,
}

impl AdvisoryGate {
    pub const ORDER: [AdvisoryGate; 4] = [
        AdvisoryGate::EntityResolution,
        AdvisoryGate::ScoringWeights,
        AdvisoryGate::CoordinateCoverage,
        AdvisoryGate::ResearchCoverage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdvisoryGate::EntityResolution => "entity_resolution",
            AdvisoryGate::ScoringWeights => "scoring_weights",
            AdvisoryGate::CoordinateCoverage => "coordinate_coverage",
            AdvisoryGate::ResearchCoverage => "research_coverage",
        }
    }
}

pub const PASS: &str = "PASS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockingResult {
    pub gate: BlockingGate,
    /// `PASS`, or the failure detail
    pub status: String,
}

impl BlockingResult {
    pub fn passed(&self) -> bool {
        self.status == PASS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisoryResult {
    pub gate: AdvisoryGate,
    /// Measured value, when one could be computed
    pub metric: Option<f64>,
    pub passed: bool,
    pub detail: Option<String>,
}

impl AdvisoryResult {
    pub fn pass(gate: AdvisoryGate, metric: f64) -> Self {
        Self {
            gate,
            metric: Some(metric),
            passed: true,
            detail: None,
        }
    }

    pub fn fail(gate: AdvisoryGate, metric: Option<f64>, detail: impl Into<String>) -> Self {
        Self {
            gate,
            metric,
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of a full gate run, in evaluation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityGateReport {
    pub assessed_at: DateTime<Utc>,
    pub blocking: Vec<BlockingResult>,
    pub advisory: Vec<AdvisoryResult>,
}

impl QualityGateReport {
    fn new(assessed_at: DateTime<Utc>) -> Self {
        Self {
            assessed_at,
            blocking: Vec::new(),
            advisory: Vec::new(),
        }
    }

    pub fn blocking_status(&self, gate: BlockingGate) -> Option<&str> {
        self.blocking
            .iter()
            .find(|r| r.gate == gate)
            .map(|r| r.status.as_str())
    }

    pub fn advisory(&self, gate: AdvisoryGate) -> Option<&AdvisoryResult> {
        self.advisory.iter().find(|r| r.gate == gate)
    }

    /// Non-blocking gates that did not pass
    pub fn warnings(&self) -> impl Iterator<Item = &AdvisoryResult> {
        self.advisory.iter().filter(|r| !r.passed)
    }
}

/// Datasets a gate run looks at
#[derive(Debug, Clone, Copy)]
pub struct GateInputs<'a> {
    pub scored: &'a ScoredTable,
    pub companies: &'a Table,
    pub buildings: &'a Table,
    /// Location of the side artifacts (entity resolution log, scoring diagnostics)
    pub root: &'a DataRoot,
}

/// Trait for implementing a quality gate run
pub trait QualityGate {
    fn assess(&self, inputs: &GateInputs<'_>) -> Result<QualityGateReport>;
}

/// Quality gate run with configurable thresholds
#[derive(Debug, Clone, Default)]
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }

    fn check_blocking(
        &self,
        gate: BlockingGate,
        inputs: &GateInputs<'_>,
    ) -> std::result::Result<(), String> {
        match gate {
            BlockingGate::CriticalFieldCompleteness => blocking::check_critical_completeness(
                inputs.scored,
                self.config.critical_completeness_min,
            ),
            BlockingGate::Uniqueness => {
                blocking::check_uniqueness(&inputs.scored.table, inputs.buildings)
            }
            BlockingGate::JoinIntegrity => blocking::check_join_integrity(
                &inputs.scored.table,
                inputs.companies,
                inputs.buildings,
            ),
        }
    }

    fn check_advisory(&self, gate: AdvisoryGate, inputs: &GateInputs<'_>) -> AdvisoryResult {
        match gate {
            AdvisoryGate::EntityResolution => {
                advisory::assess_entity_resolution(inputs.root, self.config.max_unmatched_rate)
            }
            AdvisoryGate::ScoringWeights => {
                advisory::assess_scoring_weights(inputs.root, self.config.weight_sum_tolerance)
            }
            AdvisoryGate::CoordinateCoverage => advisory::assess_coordinate_coverage(
                inputs.buildings,
                self.config.min_coordinate_coverage,
            ),
            AdvisoryGate::ResearchCoverage => advisory::assess_research_coverage(
                &inputs.scored.table,
                self.config.min_research_coverage,
            ),
        }
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, inputs: &GateInputs<'_>) -> Result<QualityGateReport> {
        let mut report = QualityGateReport::new(Utc::now());

        for gate in BlockingGate::ORDER {
            match self.check_blocking(gate, inputs) {
                Ok(()) => {
                    info!(gate = gate.name(), "Blocking quality gate passed");
                    metrics::quality_gate::blocking(gate.name(), true);
                    report.blocking.push(BlockingResult {
                        gate,
                        status: PASS.to_string(),
                    });
                }
                Err(detail) => {
                    error!(gate = gate.name(), detail = %detail, "Blocking quality gate failed");
                    metrics::quality_gate::blocking(gate.name(), false);
                    return Err(DashboardError::QualityGate {
                        gate: gate.name().to_string(),
                        detail,
                    });
                }
            }
        }

        for gate in AdvisoryGate::ORDER {
            let result = self.check_advisory(gate, inputs);
            if result.passed {
                info!(gate = gate.name(), metric = ?result.metric, "Quality gate passed");
            } else {
                warn!(
                    gate = gate.name(),
                    metric = ?result.metric,
                    detail = result.detail.as_deref().unwrap_or_default(),
                    "Non-blocking quality gate failed"
                );
            }
            metrics::quality_gate::advisory(gate.name(), result.passed, result.metric);
            report.advisory.push(result);
        }

        Ok(report)
    }
}
