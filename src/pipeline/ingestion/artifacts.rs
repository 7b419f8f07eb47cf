//! Catalogue of the artifacts the dashboard reads and where each one lives.
//!
//! An artifact is described by the directory it lives in, the base names to try
//! (preferred first, legacy fallbacks after) and the extensions accepted for it.

use std::path::PathBuf;

use crate::constants::*;
use crate::pipeline::ingestion::formats::{JSON_EXTENSIONS, TABLE_EXTENSIONS, YAML_EXTENSIONS};
use crate::pipeline::paths::DataRoot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Logical name used in logs and metrics
    pub name: &'static str,
    /// Subdirectory of the data root
    pub dir: &'static str,
    /// Base names, preferred first
    pub candidates: &'static [&'static str],
    /// Extensions tried for each base name, in order
    pub extensions: &'static [&'static str],
    /// Upstream stage that produces the artifact
    pub stage: &'static str,
}

impl ArtifactSpec {
    /// First existing file among candidates and extensions.
    pub fn resolve(&self, root: &DataRoot) -> Option<PathBuf> {
        self.candidate_paths(root).into_iter().find(|path| path.is_file())
    }

    /// Path reported when nothing resolves: preferred base name, first extension.
    pub fn expected_path(&self, root: &DataRoot) -> PathBuf {
        let base = self.candidates.first().copied().unwrap_or(self.name);
        let ext = self.extensions.first().copied().unwrap_or("csv");
        root.join(self.dir, &format!("{}.{}", base, ext))
    }

    /// Whether a resolved path came from a fallback base name.
    pub fn is_fallback(&self, path: &std::path::Path) -> bool {
        let Some(preferred) = self.candidates.first() else {
            return false;
        };
        path.file_stem().and_then(|s| s.to_str()) != Some(*preferred)
    }

    fn candidate_paths(&self, root: &DataRoot) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .flat_map(|base| {
                self.extensions
                    .iter()
                    .map(move |ext| root.join(self.dir, &format!("{}.{}", base, ext)))
            })
            .collect()
    }
}

pub const COMPANIES_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "companies",
    dir: PROCESSED_DIR,
    candidates: &[COMPANIES],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_COMPANY_EXTRACTION,
};

pub const BUILDINGS_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "buildings",
    dir: PROCESSED_DIR,
    candidates: &[GOLDEN_BUILDINGS, BUILDINGS],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_BUILDING_RECONCILIATION,
};

pub const PENETRATION_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "penetration",
    dir: PROCESSED_DIR,
    candidates: &[PENETRATION],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_BUILDING_RECONCILIATION,
};

pub const CONTACTS_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "contact_summary",
    dir: PROCESSED_DIR,
    candidates: &[CONTACTS],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_BUILDING_RECONCILIATION,
};

pub const ENTITY_RESOLUTION_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "entity_resolution_log",
    dir: PROCESSED_DIR,
    candidates: &[ENTITY_RESOLUTION_LOG],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_BUILDING_RECONCILIATION,
};

pub const SCORED_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "scored_companies",
    dir: SCORING_DIR,
    candidates: &[SCORED_COMPANIES_FINAL, SCORED_COMPANIES],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_SCORING,
};

pub const CHURN_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "churn_predictions",
    dir: SCORING_DIR,
    candidates: &[CHURN_PREDICTIONS],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_CHURN,
};

pub const COMPANY_RESEARCH_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "company_research",
    dir: SCORING_DIR,
    candidates: &[COMPANY_RESEARCH],
    extensions: TABLE_EXTENSIONS,
    stage: STAGE_WEB_RESEARCH,
};

pub const DIAGNOSTICS_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "scoring_diagnostics",
    dir: SCORING_DIR,
    candidates: &[SCORING_DIAGNOSTICS],
    extensions: JSON_EXTENSIONS,
    stage: STAGE_SCORING,
};

pub const RESEARCH_ENRICHMENT_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "research_enrichment",
    dir: RESEARCH_DIR,
    candidates: &[RESEARCH_ENRICHMENT],
    extensions: JSON_EXTENSIONS,
    stage: STAGE_RESEARCH,
};

pub const CHANNELS_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "channels",
    dir: CONFIG_DIR,
    candidates: &[CHANNELS],
    extensions: YAML_EXTENSIONS,
    stage: STAGE_CONFIGURATION,
};

pub const EXCLUSIONS_ARTIFACT: ArtifactSpec = ArtifactSpec {
    name: "exclusions",
    dir: CONFIG_DIR,
    candidates: &[EXCLUSIONS],
    extensions: YAML_EXTENSIONS,
    stage: STAGE_CONFIGURATION,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_preferred_name_wins_over_fallback() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(PROCESSED_DIR)).unwrap();
        fs::write(dir.path().join(PROCESSED_DIR).join("buildings.csv"), "x\n").unwrap();
        fs::write(dir.path().join(PROCESSED_DIR).join("golden_buildings.json"), "[]").unwrap();
        let root = DataRoot::open(dir.path()).unwrap();

        let resolved = BUILDINGS_ARTIFACT.resolve(&root).unwrap();
        assert!(resolved.ends_with("golden_buildings.json"));
        assert!(!BUILDINGS_ARTIFACT.is_fallback(&resolved));
    }

    #[test]
    fn test_fallback_is_used_and_flagged() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(SCORING_DIR)).unwrap();
        fs::write(dir.path().join(SCORING_DIR).join("scored_companies.csv"), "x\n").unwrap();
        let root = DataRoot::open(dir.path()).unwrap();

        let resolved = SCORED_ARTIFACT.resolve(&root).unwrap();
        assert!(SCORED_ARTIFACT.is_fallback(&resolved));
    }

    #[test]
    fn test_csv_tried_before_json() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(PROCESSED_DIR)).unwrap();
        fs::write(dir.path().join(PROCESSED_DIR).join("companies.csv"), "x\n").unwrap();
        fs::write(dir.path().join(PROCESSED_DIR).join("companies.json"), "[]").unwrap();
        let root = DataRoot::open(dir.path()).unwrap();

        assert!(COMPANIES_ARTIFACT
            .resolve(&root)
            .unwrap()
            .ends_with("companies.csv"));
    }

    #[test]
    fn test_nothing_resolves_reports_preferred_path() {
        let dir = tempdir().unwrap();
        let root = DataRoot::open(dir.path()).unwrap();
        assert!(CHANNELS_ARTIFACT.resolve(&root).is_none());
        assert!(CHANNELS_ARTIFACT
            .expected_path(&root)
            .ends_with("config/channels.yaml"));
    }
}
