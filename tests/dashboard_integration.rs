use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prospect_intel::app::ranked_companies::{
    validate_rank_matches_score_order, validate_segment_rank_contiguity,
};
use prospect_intel::app::{
    ranked_view, CompanyDetailUseCase, DataAccess, DatasetFilter, StartupUseCase,
};
use prospect_intel::constants::{
    CONFIG_DIR, PROCESSED_DIR, RESEARCH_DIR, RESEARCH_DOCUMENTS_DIR, SCORING_DIR, SOURCE_DATAAXLE,
};
use prospect_intel::domain::{BuildingRecord, ScoredTable, ScoringVariant};
use prospect_intel::error::DashboardError;
use prospect_intel::pipeline::processing::quality_gate::{AdvisoryGate, BlockingGate, PASS};
use prospect_intel::pipeline::processing::rerank_segments;
use prospect_intel::pipeline::DataRoot;
use tempfile::TempDir;

const COMPANIES: &str = "\
company_id,name,primary_naics,hq_latitude,hq_longitude,building_count
C1,Acme Dental,44,47.61,-122.33,3
C2,Beta Clinic,44,47.50,-122.20,
C4,Lakeside School,61111000,47.00,-122.00,2
";

const BUILDINGS: &str = "\
building_id,company_id,latitude,longitude
B1,C1,47.61,-122.33
B2,C2,47.50,-122.20
B3,C3,47.40,-122.10
";

const SCORED_HEADER: &str = "company_id,company_name,primary_naics,final_score,naics_attractiveness_score,company_opportunity_score,scoring_path,is_customer,rank";

const SCORED_ROWS: &str = "\
C1,Acme Dental,44,80,0.5,0.80,Prospect,False,1
C2,Beta Clinic,44,90,0.5,0.90,Prospect,False,2
C3,Orphan Co,44,95,0.5,0.95,Prospect,False,3
C4,Lakeside School,61111000,70,0.4,0.70,Prospect,False,1
";

const CONTACTS: &str = "\
company_id,contact_count,last_contact_date,contact_names,contact_emails
C1,2,2024-05-01,Ann;Bo,ann@acme.test;bo@acme.test
";

fn write(root: &Path, dir: &str, file: &str, body: &str) {
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), body).unwrap();
}

/// Companies, buildings and contacts, but no scored artifact.
fn unscored_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, PROCESSED_DIR, "companies.csv", COMPANIES);
    write(root, PROCESSED_DIR, "golden_buildings.csv", BUILDINGS);
    write(root, PROCESSED_DIR, "contact_summary.csv", CONTACTS);
    dir
}

fn fixture() -> TempDir {
    let dir = unscored_fixture();
    write(
        dir.path(),
        SCORING_DIR,
        "scored_companies_final.csv",
        &format!("{}\n{}", SCORED_HEADER, SCORED_ROWS),
    );
    dir
}

fn access(dir: &TempDir) -> DataAccess {
    DataAccess::new(DataRoot::open(dir.path()).unwrap(), Duration::from_secs(300))
}

fn ranks(scored: &ScoredTable) -> Vec<(String, i64)> {
    scored
        .table
        .rows()
        .map(|row| {
            (
                row.get("company_id").unwrap().to_string(),
                row.get_i64(scored.rank_column()).unwrap(),
            )
        })
        .collect()
}

#[test]
fn orphaned_scored_company_is_dropped_before_reranking() {
    let dir = fixture();
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();

    let ranked = ranks(&scored);
    assert!(ranked.iter().all(|(id, _)| id != "C3"));
    assert_eq!(
        ranked,
        vec![
            ("C2".to_string(), 1),
            ("C1".to_string(), 2),
            ("C4".to_string(), 1),
        ]
    );
    assert_eq!(validate_segment_rank_contiguity(&scored), Ok(()));
    assert_eq!(validate_rank_matches_score_order(&scored), Ok(()));
}

#[test]
fn excluded_segment_is_removed_and_rest_stay_contiguous() {
    let dir = fixture();
    write(
        dir.path(),
        CONFIG_DIR,
        "exclusions.yaml",
        "6111:\n  enabled: true\n  naics_codes: [61111000]\n  description: Schools\n",
    );
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();

    assert_eq!(
        ranks(&scored),
        vec![("C2".to_string(), 1), ("C1".to_string(), 2)]
    );
}

#[test]
fn unreadable_exclusions_apply_nothing() {
    let dir = fixture();
    write(dir.path(), CONFIG_DIR, "exclusions.yaml", "6111: [unclosed\n");
    let mut access = access(&dir);
    assert!(access.exclusions().excluded_codes().is_empty());
    assert_eq!(access.scored_companies().unwrap().table.len(), 3);
}

#[test]
fn buildings_without_source_default_to_unserved_fallback() {
    let dir = fixture();
    let mut access = access(&dir);
    let buildings = access.buildings().unwrap();

    assert_eq!(buildings.len(), 2);
    for row in buildings.rows() {
        let record = BuildingRecord::from_row(&row);
        assert_eq!(record.source, SOURCE_DATAAXLE);
        assert!(!record.is_served);
    }
}

#[test]
fn building_count_is_merged_with_zero_default() {
    let dir = fixture();
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();
    let counts: Vec<Option<&str>> = scored
        .table
        .rows()
        .map(|row| row.get("building_count"))
        .collect();
    assert_eq!(counts, vec![Some("0"), Some("3"), Some("2")]);
}

#[test]
fn reranking_loaded_data_is_a_fixed_point() {
    let dir = fixture();
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();
    assert_eq!(rerank_segments(&scored), *scored);
}

#[test]
fn startup_passes_blocking_gates_and_reports_advisories() {
    let dir = fixture();
    let mut access = access(&dir);
    let validated = StartupUseCase::default().run(&mut access).unwrap();
    let report = &validated.report;

    for gate in BlockingGate::ORDER {
        assert_eq!(report.blocking_status(gate), Some(PASS));
    }
    // No entity resolution log means nothing unmatched
    assert!(report.advisory(AdvisoryGate::EntityResolution).unwrap().passed);
    assert!(!report.advisory(AdvisoryGate::ScoringWeights).unwrap().passed);
    assert_eq!(
        report.advisory(AdvisoryGate::CoordinateCoverage).unwrap().metric,
        Some(1.0)
    );
    assert!(!report.advisory(AdvisoryGate::ResearchCoverage).unwrap().passed);
    assert_eq!(report.warnings().count(), 2);
}

#[test]
fn duplicate_scored_company_blocks_startup() {
    let dir = fixture();
    write(
        dir.path(),
        SCORING_DIR,
        "scored_companies_final.csv",
        &format!(
            "{}\n{}C1,Acme Dental,44,60,0.5,0.6,Prospect,False,4\n",
            SCORED_HEADER, SCORED_ROWS
        ),
    );
    let mut access = access(&dir);
    let err = StartupUseCase::default().run(&mut access).unwrap_err();
    match err {
        DashboardError::QualityGate { gate, .. } => assert_eq!(gate, "uniqueness"),
        other => panic!("expected a blocking gate failure, got {other}"),
    }
}

#[test]
fn cached_artifacts_are_shared_until_invalidated() {
    let dir = fixture();
    let mut access = access(&dir);
    let first = access.scored_companies().unwrap();
    let second = access.scored_companies().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    write(
        dir.path(),
        SCORING_DIR,
        "scored_companies_final.csv",
        &format!("{}\nC1,Acme Dental,44,80,0.5,0.8,Prospect,False,1\n", SCORED_HEADER),
    );
    assert_eq!(access.scored_companies().unwrap().table.len(), 3);

    access.invalidate_all();
    let reloaded = access.scored_companies().unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(reloaded.table.len(), 1);
}

#[test]
fn missing_companies_names_the_producing_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut access = access(&dir);
    let err = access.companies().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("companies.csv"));
    assert!(message.contains("company extraction"));
}

#[test]
fn missing_data_root_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = DataRoot::resolve_with(None, missing.to_str(), Path::new("./data")).unwrap_err();
    assert!(matches!(err, DashboardError::MissingDataRoot { .. }));
}

#[test]
fn ranked_view_honours_segment_filter() {
    let dir = fixture();
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();
    let filter = DatasetFilter {
        segments: vec![prospect_intel::domain::SegmentCode::Numeric(61111000)],
        ..DatasetFilter::default()
    };
    let view = ranked_view(&scored.with_table(filter.apply(&scored.table)), None);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].company_id, "C4");
    assert_eq!(view[0].global_rank, 1);
    assert_eq!(view[0].building_count, 2);
}

#[test]
fn company_detail_combines_cached_artifacts() {
    let dir = fixture();
    let mut access = access(&dir);
    let detail = CompanyDetailUseCase::load(&mut access, "C1").unwrap().unwrap();

    assert_eq!(detail.company.name.as_deref(), Some("Acme Dental"));
    assert_eq!(detail.buildings.len(), 1);
    assert_eq!(detail.penetration_rate, 0.0);
    assert_eq!(detail.contacts.unwrap().contact_names, vec!["Ann", "Bo"]);
    assert_eq!(detail.score.unwrap().segment_rank, Some(2));
    assert!(detail.churn.is_none());
    assert!(detail.research_document.is_none());

    assert!(CompanyDetailUseCase::load(&mut access, "C3").unwrap().is_none());
}

#[test]
fn company_detail_uses_the_companies_spelling_of_the_id() {
    let dir = fixture();
    write(
        dir.path(),
        PROCESSED_DIR,
        "companies.csv",
        &format!("{}0007,Seven Co,44,47.10,-122.10,1\n", COMPANIES),
    );
    write(
        dir.path(),
        &format!("{}/{}", RESEARCH_DIR, RESEARCH_DOCUMENTS_DIR),
        "0007.json",
        r#"{"summary": "seven"}"#,
    );
    let mut access = access(&dir);

    let detail = CompanyDetailUseCase::load(&mut access, "7").unwrap().unwrap();
    assert_eq!(detail.company.company_id, "0007");
    assert_eq!(detail.research_document.unwrap()["summary"], "seven");

    assert!(CompanyDetailUseCase::load(&mut access, "../0007").unwrap().is_none());
}

#[test]
fn reloaded_companies_reach_scored_rows_cached_earlier() {
    let dir = fixture();
    let mut access = DataAccess::new(
        DataRoot::open(dir.path()).unwrap(),
        Duration::from_millis(400),
    );
    access.companies().unwrap();
    thread::sleep(Duration::from_millis(250));
    assert_eq!(access.scored_companies().unwrap().table.len(), 3);

    write(
        dir.path(),
        PROCESSED_DIR,
        "companies.csv",
        "company_id,name,primary_naics,hq_latitude,hq_longitude,building_count\n\
         C2,Beta Clinic,44,47.50,-122.20,\n\
         C4,Lakeside School,61111000,47.00,-122.00,2\n",
    );
    // Companies have expired; the scored entry has not
    thread::sleep(Duration::from_millis(250));

    let validated = StartupUseCase::default().run(&mut access).unwrap();
    assert_eq!(validated.companies.len(), 2);
    assert_eq!(
        ranks(&validated.scored),
        vec![("C2".to_string(), 1), ("C4".to_string(), 1)]
    );
    assert!(validated
        .buildings
        .rows()
        .all(|row| row.get("company_id") != Some("C1")));
}

#[test]
fn legacy_scored_artifact_is_reranked_on_segment_rank() {
    let dir = unscored_fixture();
    write(
        dir.path(),
        SCORING_DIR,
        "scored_companies.csv",
        "\
company_id,company_name,primary_naics,source,channel_id,standard_score,augmented_score,augmented_confidence,segment_rank,icp_fit_score,urgent_flags,action_flags,has_research_doc
C1,Acme Dental,44,dataaxle,direct,60,0.60,high,1,0.7,,,True
C2,Beta Clinic,44,dataaxle,direct,70,0.90,high,2,0.8,,,False
C3,Orphan Co,44,dataaxle,direct,80,0.95,high,3,0.9,,,True
C4,Lakeside School,61111000,dataaxle,partner,50,0.40,low,4,0.5,,,True
",
    );
    let mut access = access(&dir);
    let scored = access.scored_companies().unwrap();

    assert_eq!(scored.variant, ScoringVariant::Legacy);
    assert_eq!(scored.rank_column(), "segment_rank");
    assert_eq!(
        ranks(&scored),
        vec![
            ("C2".to_string(), 1),
            ("C1".to_string(), 2),
            ("C4".to_string(), 1),
        ]
    );
    assert_eq!(validate_segment_rank_contiguity(&scored), Ok(()));
    assert_eq!(validate_rank_matches_score_order(&scored), Ok(()));

    let validated = StartupUseCase::default().run(&mut access).unwrap();
    for gate in BlockingGate::ORDER {
        assert_eq!(validated.report.blocking_status(gate), Some(PASS));
    }
    let detail = CompanyDetailUseCase::load(&mut access, "C1").unwrap().unwrap();
    let score = detail.score.unwrap();
    assert_eq!(score.variant, ScoringVariant::Legacy);
    assert_eq!(score.components.get("icp_fit_score"), Some(&70.0));
}

#[test]
fn companies_may_be_stored_as_json_records() {
    let dir = fixture();
    fs::remove_file(dir.path().join(PROCESSED_DIR).join("companies.csv")).unwrap();
    write(
        dir.path(),
        PROCESSED_DIR,
        "companies.json",
        r#"[
  {"company_id": "C1", "name": "Acme Dental", "primary_naics": 44, "hq_latitude": 47.61, "hq_longitude": -122.33, "building_count": 3},
  {"company_id": "C2", "name": "Beta Clinic", "primary_naics": 44, "hq_latitude": 47.5, "hq_longitude": -122.2, "building_count": null},
  {"company_id": "C4", "name": "Lakeside School", "primary_naics": 61111000, "hq_latitude": 47.0, "hq_longitude": -122.0, "building_count": 2}
]"#,
    );
    let mut access = access(&dir);

    let companies = access.companies().unwrap();
    assert_eq!(companies.len(), 3);
    assert_eq!(companies.row(1).unwrap().get("building_count"), None);
    assert_eq!(
        ranks(&access.scored_companies().unwrap()),
        vec![
            ("C2".to_string(), 1),
            ("C1".to_string(), 2),
            ("C4".to_string(), 1),
        ]
    );
}
