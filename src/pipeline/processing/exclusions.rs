//! Industry exclusions: segments removed from scoring views by category.
//!
//! The YAML document maps category names to `{enabled, naics_codes, description}`.
//! Entries whose value is not a mapping are ignored so documentation keys can live
//! alongside categories.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::constants::LOG_SAMPLE_SIZE;
use crate::domain::{SegmentCode, Table};
use crate::observability::metrics;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExclusionCategory {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub naics_codes: Vec<CodeValue>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Codes may be written as integers, floats or quoted strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CodeValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CodeValue {
    pub fn to_segment(&self) -> Option<SegmentCode> {
        match self {
            CodeValue::Int(n) => Some(SegmentCode::Numeric(*n)),
            CodeValue::Float(f) => SegmentCode::parse(&f.to_string()),
            CodeValue::Text(s) => SegmentCode::parse(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExclusionConfig {
    categories: BTreeMap<String, ExclusionCategory>,
}

impl ExclusionConfig {
    /// Build from a parsed YAML document, skipping entries that are not categories.
    pub fn from_yaml_value(value: serde_yaml::Value) -> Self {
        let mapping = match value {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => return Self::default(),
            other => {
                warn!(kind = ?other, "Exclusion config is not a mapping; no exclusions applied");
                return Self::default();
            }
        };

        let mut categories = BTreeMap::new();
        for (key, entry) in mapping {
            // Category names are often bare NAICS prefixes, which YAML reads as numbers
            let name = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !entry.is_mapping() {
                debug!(key = %name, "Skipping non-category exclusion entry");
                continue;
            }
            match serde_yaml::from_value::<ExclusionCategory>(entry) {
                Ok(category) => {
                    categories.insert(name, category);
                }
                Err(e) => warn!(category = %name, error = %e, "Ignoring malformed exclusion category"),
            }
        }
        Self { categories }
    }

    pub fn categories(&self) -> &BTreeMap<String, ExclusionCategory> {
        &self.categories
    }

    /// Union of the codes of every enabled category.
    pub fn excluded_codes(&self) -> BTreeSet<SegmentCode> {
        self.categories
            .iter()
            .filter(|(_, category)| category.enabled)
            .flat_map(|(name, category)| {
                debug!(
                    category = %name,
                    codes = category.naics_codes.len(),
                    "Exclusion category enabled"
                );
                category.naics_codes.iter().filter_map(CodeValue::to_segment)
            })
            .collect()
    }
}

/// Remove rows whose `primary_naics` is excluded.
pub fn apply_exclusions(scored: &Table, config: &ExclusionConfig) -> Table {
    let excluded = config.excluded_codes();
    if excluded.is_empty() || !scored.has_column("primary_naics") {
        return scored.clone();
    }

    let mut hit_segments: BTreeSet<SegmentCode> = BTreeSet::new();
    let kept = scored.filter_rows(|row| {
        match row.get("primary_naics").and_then(SegmentCode::parse) {
            Some(code) if excluded.contains(&code) => {
                hit_segments.insert(code);
                false
            }
            _ => true,
        }
    });

    let removed = scored.len() - kept.len();
    if removed > 0 {
        let sample: Vec<String> = hit_segments
            .iter()
            .take(LOG_SAMPLE_SIZE)
            .map(|c| c.to_string())
            .collect();
        info!(
            removed = removed,
            segments = ?sample,
            "Excluded companies in disabled industries"
        );
        metrics::filter::exclusions_removed(removed);
    }
    kept
}
