/// Environment and artifact name constants shared across the loaders and gates.

// Environment variable selecting the data root
pub const DATA_DIR_ENV: &str = "PROSPECT_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

// Data root subdirectories
pub const PROCESSED_DIR: &str = "processed";
pub const SCORING_DIR: &str = "scoring";
pub const RESEARCH_DIR: &str = "research";
pub const RESEARCH_DOCUMENTS_DIR: &str = "research_documents";
pub const CONFIG_DIR: &str = "config";

// Artifact base names (extension resolved at load time)
pub const COMPANIES: &str = "companies";
pub const GOLDEN_BUILDINGS: &str = "golden_buildings";
pub const BUILDINGS: &str = "buildings";
pub const PENETRATION: &str = "penetration_by_company";
pub const CONTACTS: &str = "contact_summary";
pub const SCORED_COMPANIES_FINAL: &str = "scored_companies_final";
pub const SCORED_COMPANIES: &str = "scored_companies";
pub const CHURN_PREDICTIONS: &str = "churn_predictions";
pub const COMPANY_RESEARCH: &str = "company_icp_scores_with_research";
pub const SCORING_DIAGNOSTICS: &str = "scoring_diagnostics";
pub const RESEARCH_ENRICHMENT: &str = "research_enrichment";
pub const CHANNELS: &str = "channels";
pub const EXCLUSIONS: &str = "exclusions";
pub const ENTITY_RESOLUTION_LOG: &str = "entity_resolution_log";

// Upstream stages named in load errors
pub const STAGE_COMPANY_EXTRACTION: &str = "company extraction";
pub const STAGE_BUILDING_RECONCILIATION: &str = "building reconciliation";
pub const STAGE_RESEARCH: &str = "research";
pub const STAGE_SCORING: &str = "scoring";
pub const STAGE_CHURN: &str = "churn modelling";
pub const STAGE_WEB_RESEARCH: &str = "web research scoring";
pub const STAGE_CONFIGURATION: &str = "configuration";

// Building provenance tags
pub const SOURCE_DATAAXLE: &str = "dataaxle";
pub const SERVED_SOURCES: [&str; 2] = ["manual", "hubspot"];

// Entity resolution match type counted as orphaned
pub const MATCH_TYPE_UNMATCHED: &str = "unmatched";

/// Upper bound on identifiers quoted in log lines and gate failures.
pub const LOG_SAMPLE_SIZE: usize = 5;

/// Whether a provenance tag denotes a building that is currently served.
pub fn is_served_source(source: &str) -> bool {
    let lowered = source.trim().to_lowercase();
    SERVED_SOURCES.iter().any(|s| *s == lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_served_sources_are_case_insensitive() {
        assert!(is_served_source("HubSpot"));
        assert!(is_served_source(" manual "));
        assert!(!is_served_source(SOURCE_DATAAXLE));
        assert!(!is_served_source(""));
    }
}
