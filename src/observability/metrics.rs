//! Metrics for the prospect dashboard core
//!
//! Recording goes through the `metrics` facade. When no recorder is installed every
//! call is a no-op, so library code records unconditionally. The CLI installs the
//! Prometheus recorder with [`init`] and prints [`render`] on request.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Every metric name recorded by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Loader metrics
    LoaderArtifactsLoaded,
    LoaderArtifactErrors,
    LoaderRowsLoaded,

    // Filter metrics
    FilterOrphansRemoved,
    FilterExclusionsRemoved,

    // Ranking metrics
    RankingSegments,
    RankingRowsRanked,

    // Cache metrics
    CacheHits,
    CacheMisses,
    CacheInvalidations,

    // Quality Gate metrics
    QualityGateBlockingPassed,
    QualityGateBlockingFailed,
    QualityGateAdvisoryPassed,
    QualityGateAdvisoryFailed,
    QualityGateAdvisoryMetric,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::LoaderArtifactsLoaded => "prospect_loader_artifacts_loaded_total",
            MetricName::LoaderArtifactErrors => "prospect_loader_artifact_errors_total",
            MetricName::LoaderRowsLoaded => "prospect_loader_rows_loaded",

            MetricName::FilterOrphansRemoved => "prospect_filter_orphans_removed_total",
            MetricName::FilterExclusionsRemoved => "prospect_filter_exclusions_removed_total",

            MetricName::RankingSegments => "prospect_ranking_segments",
            MetricName::RankingRowsRanked => "prospect_ranking_rows_ranked",

            MetricName::CacheHits => "prospect_cache_hits_total",
            MetricName::CacheMisses => "prospect_cache_misses_total",
            MetricName::CacheInvalidations => "prospect_cache_invalidations_total",

            MetricName::QualityGateBlockingPassed => "prospect_quality_gate_blocking_passed_total",
            MetricName::QualityGateBlockingFailed => "prospect_quality_gate_blocking_failed_total",
            MetricName::QualityGateAdvisoryPassed => "prospect_quality_gate_advisory_passed_total",
            MetricName::QualityGateAdvisoryFailed => "prospect_quality_gate_advisory_failed_total",
            MetricName::QualityGateAdvisoryMetric => "prospect_quality_gate_advisory_metric",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            LoaderArtifactsLoaded,
            LoaderArtifactErrors,
            LoaderRowsLoaded,
            FilterOrphansRemoved,
            FilterExclusionsRemoved,
            RankingSegments,
            RankingRowsRanked,
            CacheHits,
            CacheMisses,
            CacheInvalidations,
            QualityGateBlockingPassed,
            QualityGateBlockingFailed,
            QualityGateAdvisoryPassed,
            QualityGateAdvisoryFailed,
            QualityGateAdvisoryMetric,
        ]
        .into_iter()
    }

    /// Gauges hold the last observed value; everything else is a counter.
    pub fn is_gauge(&self) -> bool {
        matches!(
            self,
            MetricName::LoaderRowsLoaded
                | MetricName::RankingSegments
                | MetricName::RankingRowsRanked
                | MetricName::QualityGateAdvisoryMetric
        )
    }

    /// Returns (phase, description, unit)
    pub fn metadata(&self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            MetricName::LoaderArtifactsLoaded => ("loader", "Artifacts loaded successfully", None),
            MetricName::LoaderArtifactErrors => ("loader", "Artifact loads that failed", None),
            MetricName::LoaderRowsLoaded => ("loader", "Rows in the last load of an artifact", None),

            MetricName::FilterOrphansRemoved => ("filter", "Rows dropped for unknown company", None),
            MetricName::FilterExclusionsRemoved => ("filter", "Rows dropped by industry exclusions", None),

            MetricName::RankingSegments => ("ranking", "Segments in the last re-rank", None),
            MetricName::RankingRowsRanked => ("ranking", "Rows in the last re-rank", None),

            MetricName::CacheHits => ("cache", "Artifact reads served from cache", None),
            MetricName::CacheMisses => ("cache", "Artifact reads that hit disk", None),
            MetricName::CacheInvalidations => ("cache", "Explicit cache refreshes", None),

            MetricName::QualityGateBlockingPassed => ("quality_gate", "Blocking gates passed", None),
            MetricName::QualityGateBlockingFailed => ("quality_gate", "Blocking gates failed", None),
            MetricName::QualityGateAdvisoryPassed => ("quality_gate", "Non-blocking gates passed", None),
            MetricName::QualityGateAdvisoryFailed => ("quality_gate", "Non-blocking gates failed", None),
            MetricName::QualityGateAdvisoryMetric => ("quality_gate", "Measured non-blocking gate value", Some("ratio")),
        }
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice keeps the first recorder.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    describe_all();
    info!("Metrics system initialized");
    Ok(())
}

/// Register HELP text for every metric with the installed recorder.
fn describe_all() {
    for metric in MetricName::all_metrics() {
        let (_, description, unit) = metric.metadata();
        let help = match unit {
            Some(unit) => format!("{} ({})", description, unit),
            None => description.to_string(),
        };
        if metric.is_gauge() {
            ::metrics::describe_gauge!(metric.as_str(), help);
        } else {
            ::metrics::describe_counter!(metric.as_str(), help);
        }
    }
}

/// Current metrics in Prometheus text format, if [`init`] ran.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Loader Metrics
// ============================================================================

pub mod loader {
    use super::MetricName;

    pub fn artifact_loaded(artifact: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::LoaderArtifactsLoaded.as_str(), "artifact" => artifact)
            .increment(1);
        ::metrics::gauge!(MetricName::LoaderRowsLoaded.as_str(), "artifact" => artifact)
            .set(rows as f64);
    }

    pub fn artifact_error(artifact: &'static str) {
        ::metrics::counter!(MetricName::LoaderArtifactErrors.as_str(), "artifact" => artifact)
            .increment(1);
    }
}

// ============================================================================
// Filter Metrics
// ============================================================================

pub mod filter {
    use super::MetricName;

    pub fn orphans_removed(artifact: &str, count: usize) {
        ::metrics::counter!(MetricName::FilterOrphansRemoved.as_str(), "artifact" => artifact.to_string())
            .increment(count as u64);
    }

    pub fn exclusions_removed(count: usize) {
        ::metrics::counter!(MetricName::FilterExclusionsRemoved.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Ranking Metrics
// ============================================================================

pub mod ranking {
    use super::MetricName;

    pub fn reranked(segments: usize, rows: usize) {
        ::metrics::gauge!(MetricName::RankingSegments.as_str()).set(segments as f64);
        ::metrics::gauge!(MetricName::RankingRowsRanked.as_str()).set(rows as f64);
    }
}

// ============================================================================
// Cache Metrics
// ============================================================================

pub mod cache {
    use super::MetricName;

    pub fn hit(artifact: &'static str) {
        ::metrics::counter!(MetricName::CacheHits.as_str(), "artifact" => artifact).increment(1);
    }

    pub fn miss(artifact: &'static str) {
        ::metrics::counter!(MetricName::CacheMisses.as_str(), "artifact" => artifact).increment(1);
    }

    pub fn invalidated() {
        ::metrics::counter!(MetricName::CacheInvalidations.as_str()).increment(1);
    }
}

// ============================================================================
// Quality Gate Metrics
// ============================================================================

pub mod quality_gate {
    use super::MetricName;

    pub fn blocking(gate: &'static str, passed: bool) {
        let name = if passed {
            MetricName::QualityGateBlockingPassed
        } else {
            MetricName::QualityGateBlockingFailed
        };
        ::metrics::counter!(name.as_str(), "gate" => gate).increment(1);
    }

    pub fn advisory(gate: &'static str, passed: bool, metric: Option<f64>) {
        let name = if passed {
            MetricName::QualityGateAdvisoryPassed
        } else {
            MetricName::QualityGateAdvisoryFailed
        };
        ::metrics::counter!(name.as_str(), "gate" => gate).increment(1);
        if let Some(value) = metric {
            ::metrics::gauge!(MetricName::QualityGateAdvisoryMetric.as_str(), "gate" => gate)
                .set(value);
        }
    }
}
