//! Loaders for every artifact the dashboard reads.
//!
//! Required artifacts fail with a [`DashboardError`] that names the path and the
//! stage to rerun. Optional artifacts return [`Availability`] and only log.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::artifacts::*;
use super::documents::{ChannelsConfig, ResearchEnrichment};
use super::formats::{read_json, read_table, read_yaml};
use super::schema::validate_schema;
use crate::constants::{RESEARCH_DIR, RESEARCH_DOCUMENTS_DIR};
use crate::domain::{Availability, ScoredTable, ScoringVariant, Table};
use crate::error::{DashboardError, Result};
use crate::observability::metrics;
use crate::pipeline::paths::DataRoot;
use crate::pipeline::processing::exclusions::{apply_exclusions, ExclusionConfig};
use crate::pipeline::processing::merge::merge_building_count;
use crate::pipeline::processing::provenance::derive_building_provenance;
use crate::pipeline::processing::referential::{filter_orphans, CompanyIndex};
use crate::pipeline::processing::rerank::rerank_segments;

pub const COMPANY_COLUMNS: &[&str] = &[
    "company_id",
    "name",
    "primary_naics",
    "hq_latitude",
    "hq_longitude",
];
pub const BUILDING_COLUMNS: &[&str] = &["building_id", "company_id", "latitude", "longitude"];
pub const PENETRATION_COLUMNS: &[&str] = &[
    "company_id",
    "served_buildings",
    "total_buildings_estimate",
    "penetration_rate",
];
pub const CONTACT_COLUMNS: &[&str] = &[
    "company_id",
    "contact_count",
    "last_contact_date",
    "contact_names",
    "contact_emails",
];
pub const CHURN_COLUMNS: &[&str] = &[
    "company_id",
    "churn_probability",
    "risk_tier",
    "prediction_date",
];
pub const COMPANY_RESEARCH_COLUMNS: &[&str] = &[
    "company_id",
    "company_name",
    "had_web_research",
    "icp_fit_score",
    "confidence",
    "reasoning",
    "recommendation",
];

/// Resolve and read a required tabular artifact.
fn read_required(spec: &ArtifactSpec, root: &DataRoot) -> Result<(PathBuf, Table)> {
    let Some(path) = spec.resolve(root) else {
        metrics::loader::artifact_error(spec.name);
        let reason = if spec.candidates.len() > 1 {
            format!("required file not found (tried {})", spec.candidates.join(", "))
        } else {
            "required file not found".to_string()
        };
        return Err(DashboardError::load(
            spec.expected_path(root).display().to_string(),
            spec.stage,
            reason,
        ));
    };
    let table = read_table(&path, spec.stage).map_err(|e| {
        metrics::loader::artifact_error(spec.name);
        e
    })?;
    Ok((path, table))
}

fn validated(spec: &ArtifactSpec, table: &Table, required: &[&str]) -> Result<()> {
    validate_schema(table, required, table.name()).map_err(|e| {
        metrics::loader::artifact_error(spec.name);
        e
    })
}

fn loaded(spec: &ArtifactSpec, path: &Path, table: Table) -> Table {
    info!(
        artifact = spec.name,
        rows = table.len(),
        path = %path.display(),
        "Loaded artifact"
    );
    metrics::loader::artifact_loaded(spec.name, table.len());
    table
}

pub fn load_companies(root: &DataRoot) -> Result<Table> {
    let spec = &COMPANIES_ARTIFACT;
    let (path, table) = read_required(spec, root)?;
    validated(spec, &table, COMPANY_COLUMNS)?;
    let table = table.with_alias("building_count_estimate", "building_count");
    Ok(loaded(spec, &path, table))
}

/// Buildings, with provenance columns filled in and orphans removed.
pub fn load_buildings(root: &DataRoot, companies: &Table) -> Result<Table> {
    let spec = &BUILDINGS_ARTIFACT;
    let (path, table) = read_required(spec, root)?;
    if spec.is_fallback(&path) {
        warn!(
            path = %path.display(),
            "Golden buildings not found; using legacy buildings artifact"
        );
    }
    validated(spec, &table, BUILDING_COLUMNS)?;

    let table = derive_building_provenance(&table);
    let table = filter_orphans(&table, &CompanyIndex::from_companies(companies));
    Ok(loaded(spec, &path, table))
}

/// Scored companies: orphans removed, exclusions applied, segments re-ranked and
/// `building_count` merged from the companies artifact.
pub fn load_scored_companies(
    root: &DataRoot,
    companies: &Table,
    exclusions: &ExclusionConfig,
) -> Result<ScoredTable> {
    let spec = &SCORED_ARTIFACT;
    let (path, table) = read_required(spec, root)?;
    if spec.is_fallback(&path) {
        info!(path = %path.display(), "Using scored companies without the final scoring pass");
    }

    let variant = ScoringVariant::detect(&table);
    debug!(variant = %variant, "Detected scoring schema");
    validated(spec, &table, &variant.required_columns())?;

    let table = filter_orphans(&table, &CompanyIndex::from_companies(companies));
    let table = apply_exclusions(&table, exclusions);
    let ranked = rerank_segments(&ScoredTable::new(variant, table));
    let merged = merge_building_count(&ranked.table, companies);
    Ok(ranked.with_table(loaded(spec, &path, merged)))
}

pub fn load_penetration(root: &DataRoot) -> Result<Table> {
    let spec = &PENETRATION_ARTIFACT;
    let (path, table) = read_required(spec, root)?;
    validated(spec, &table, PENETRATION_COLUMNS)?;
    Ok(loaded(spec, &path, table))
}

pub fn load_contacts(root: &DataRoot) -> Result<Table> {
    let spec = &CONTACTS_ARTIFACT;
    let (path, table) = read_required(spec, root)?;
    validated(spec, &table, CONTACT_COLUMNS)?;
    Ok(loaded(spec, &path, table))
}

pub fn load_research_enrichment(root: &DataRoot) -> Result<ResearchEnrichment> {
    let spec = &RESEARCH_ENRICHMENT_ARTIFACT;
    let path = spec.resolve(root).ok_or_else(|| {
        metrics::loader::artifact_error(spec.name);
        DashboardError::load(
            spec.expected_path(root).display().to_string(),
            spec.stage,
            "required file not found",
        )
    })?;
    let enrichment: ResearchEnrichment = read_json(&path, spec.stage).map_err(|e| {
        metrics::loader::artifact_error(spec.name);
        e
    })?;
    info!(companies = enrichment.company_count(), "Loaded research enrichment");
    metrics::loader::artifact_loaded(spec.name, enrichment.company_count());
    Ok(enrichment)
}

/// Per-company research document. Missing or invalid documents yield `None`.
pub fn load_research_document(root: &DataRoot, company_id: &str) -> Option<serde_json::Value> {
    let id = company_id.trim();
    if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
        warn!(company_id = company_id, "Rejecting research document id that is not a plain file name");
        return None;
    }
    let path = root
        .path()
        .join(RESEARCH_DIR)
        .join(RESEARCH_DOCUMENTS_DIR)
        .join(format!("{}.json", id));
    if !path.is_file() {
        debug!(company_id = company_id, "No research document");
        return None;
    }
    match read_json(&path, RESEARCH_ENRICHMENT_ARTIFACT.stage) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(company_id = company_id, error = %e, "Ignoring unreadable research document");
            None
        }
    }
}

pub fn load_channels(root: &DataRoot) -> Result<ChannelsConfig> {
    let spec = &CHANNELS_ARTIFACT;
    let path = spec.resolve(root).ok_or_else(|| {
        metrics::loader::artifact_error(spec.name);
        DashboardError::load(
            spec.expected_path(root).display().to_string(),
            spec.stage,
            "required file not found",
        )
    })?;
    let channels: ChannelsConfig = read_yaml(&path, spec.stage).map_err(|e| {
        metrics::loader::artifact_error(spec.name);
        e
    })?;
    info!(
        channels = channels.len(),
        ids = ?channels.channel_ids(),
        "Loaded channel definitions"
    );
    metrics::loader::artifact_loaded(spec.name, channels.len());
    Ok(channels)
}

/// Industry exclusions. Never fails: absence or a broken file means no exclusions.
pub fn load_exclusions(root: &DataRoot) -> ExclusionConfig {
    let spec = &EXCLUSIONS_ARTIFACT;
    let Some(path) = spec.resolve(root) else {
        debug!("No exclusions config; all industries included");
        return ExclusionConfig::default();
    };
    match read_yaml::<serde_yaml::Value>(&path, spec.stage) {
        Ok(value) => {
            let config = ExclusionConfig::from_yaml_value(value);
            info!(
                categories = config.categories().len(),
                excluded_codes = config.excluded_codes().len(),
                "Loaded industry exclusions"
            );
            config
        }
        Err(e) => {
            warn!(error = %e, "Failed to load exclusions; no industries excluded");
            metrics::loader::artifact_error(spec.name);
            ExclusionConfig::default()
        }
    }
}

pub fn load_churn_predictions(root: &DataRoot) -> Availability<Table> {
    load_optional(&CHURN_ARTIFACT, root, |table| {
        validate_schema(table, CHURN_COLUMNS, table.name())
    })
}

/// Web-research scores. Missing expected columns only warn.
pub fn load_company_research(root: &DataRoot) -> Availability<Table> {
    load_optional(&COMPANY_RESEARCH_ARTIFACT, root, |table| {
        let missing: Vec<&str> = COMPANY_RESEARCH_COLUMNS
            .iter()
            .copied()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            warn!(artifact = table.name(), missing = ?missing, "Research scores missing expected columns");
        }
        Ok(())
    })
}

fn load_optional<F>(spec: &ArtifactSpec, root: &DataRoot, check: F) -> Availability<Table>
where
    F: FnOnce(&Table) -> Result<()>,
{
    let Some(path) = spec.resolve(root) else {
        info!(
            artifact = spec.name,
            stage = spec.stage,
            "Optional artifact not produced yet"
        );
        return Availability::Unavailable(format!(
            "{} not found; run the {} stage to generate it",
            spec.expected_path(root).display(),
            spec.stage
        ));
    };
    match read_table(&path, spec.stage).and_then(|table| check(&table).map(|()| table)) {
        Ok(table) => Availability::Available(loaded(spec, &path, table)),
        Err(e) => {
            warn!(artifact = spec.name, error = %e, "Continuing without optional artifact");
            metrics::loader::artifact_error(spec.name);
            Availability::Unavailable(e.to_string())
        }
    }
}
