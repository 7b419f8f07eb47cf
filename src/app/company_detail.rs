//! Everything shown for a single company, assembled from the cached artifacts.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::app::data_access::DataAccess;
use crate::app::ranked_companies::DEFAULT_SCORING_PATH;
use crate::domain::{
    BuildingRecord, CompanyKey, CompanyRecord, EmbeddedJson, Row, ScoredTable, ScoringVariant,
    SegmentCode, Table,
};
use crate::error::Result;

/// Legacy score components, stored on a 0-1 scale.
const SCORE_COMPONENTS: &[&str] = &[
    "icp_fit_score",
    "expansion_potential",
    "decision_maker_clarity",
    "hygiene_relevance",
    "revenue_potential",
    "buyer_intent",
    "geographic_fit",
];

/// First row whose `company_id` equals the identifier, exactly or after normalization.
pub fn find_company<'a>(table: &'a Table, company_id: &str) -> Option<Row<'a>> {
    let wanted = company_id.trim();
    let key = CompanyKey::new(wanted);
    table
        .rows()
        .find(|row| row.get("company_id").is_some_and(|id| id.trim() == wanted))
        .or_else(|| {
            table
                .rows()
                .find(|row| row.get("company_id").is_some_and(|id| CompanyKey::new(id) == key))
        })
}

fn rows_for<'a>(table: &'a Table, company_id: &str) -> Vec<Row<'a>> {
    let key = CompanyKey::new(company_id);
    table
        .rows()
        .filter(|row| row.get("company_id").is_some_and(|id| CompanyKey::new(id) == key))
        .collect()
}

pub fn company_buildings(buildings: &Table, company_id: &str) -> Vec<BuildingRecord> {
    rows_for(buildings, company_id)
        .iter()
        .map(BuildingRecord::from_row)
        .collect()
}

/// Served share of the buildings, as a percentage; 0 with no buildings.
pub fn penetration_rate(buildings: &[BuildingRecord]) -> f64 {
    if buildings.is_empty() {
        return 0.0;
    }
    let served = buildings.iter().filter(|b| b.is_served).count();
    served as f64 / buildings.len() as f64 * 100.0
}

/// Headquarters details for the company header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HqInfo {
    pub city: Option<String>,
    pub state: Option<String>,
    pub coordinates: Option<(f64, f64)>,
    pub building_count: Option<i64>,
    pub employees: Option<i64>,
}

impl HqInfo {
    pub fn from_company(company: &CompanyRecord) -> Self {
        Self {
            city: company.city.clone(),
            state: company.state.clone(),
            coordinates: company.hq_coordinates(),
            building_count: company.building_count,
            employees: company.employees.map(|e| e.trunc() as i64),
        }
    }
}

/// Company-level contact aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSummary {
    pub contact_count: i64,
    pub last_contact_date: Option<NaiveDate>,
    pub contact_names: Vec<String>,
    pub contact_emails: Vec<String>,
}

pub fn contact_summary(contacts: &Table, company_id: &str) -> Option<ContactSummary> {
    let row = find_company(contacts, company_id)?;
    Some(ContactSummary {
        contact_count: row.get_i64("contact_count").unwrap_or(0),
        last_contact_date: row.get("last_contact_date").and_then(parse_date),
        contact_names: split_list(row.get("contact_names")),
        contact_emails: split_list(row.get("contact_emails")),
    })
}

/// A list cell written either as a JSON array or as delimited text.
fn split_list(cell: Option<&str>) -> Vec<String> {
    match EmbeddedJson::parse(cell) {
        Some(EmbeddedJson::Parsed(serde_json::Value::Array(items))) => items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(_) => cell
            .unwrap_or_default()
            .split([';', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Leading `YYYY-MM-DD` of a date or timestamp cell.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnPrediction {
    pub churn_probability: Option<f64>,
    pub risk_tier: Option<String>,
    pub prediction_date: Option<NaiveDate>,
}

/// `None` when the dataset is absent or has no row for the company.
pub fn churn_prediction(churn: Option<&Table>, company_id: &str) -> Option<ChurnPrediction> {
    let row = find_company(churn?, company_id)?;
    Some(ChurnPrediction {
        churn_probability: row.get_f64("churn_probability"),
        risk_tier: row.get("risk_tier").map(str::to_string),
        prediction_date: row.get("prediction_date").and_then(parse_date),
    })
}

/// How a company's score was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub variant: ScoringVariant,
    pub scoring_path: String,
    pub segment: Option<SegmentCode>,
    pub segment_rank: Option<i64>,
    pub score: Option<f64>,
    pub naics_attractiveness_score: Option<f64>,
    pub company_opportunity_score: Option<f64>,
    pub scoring_reason: Option<String>,
    /// Legacy components rescaled to 0-100, keyed by column name.
    pub components: BTreeMap<String, f64>,
}

pub fn score_breakdown(scored: &ScoredTable, company_id: &str) -> Option<ScoreBreakdown> {
    let row = find_company(&scored.table, company_id)?;
    let components = SCORE_COMPONENTS
        .iter()
        .filter_map(|name| row.get_f64(name).map(|v| (name.to_string(), v * 100.0)))
        .collect();
    Some(ScoreBreakdown {
        variant: scored.variant,
        scoring_path: row
            .get("scoring_path")
            .unwrap_or(DEFAULT_SCORING_PATH)
            .to_string(),
        segment: row.get("primary_naics").and_then(SegmentCode::parse),
        segment_rank: row.get_i64(scored.rank_column()),
        score: row.get_f64(scored.score_column()),
        naics_attractiveness_score: row.get_f64("naics_attractiveness_score"),
        company_opportunity_score: row.get_f64("company_opportunity_score"),
        scoring_reason: row.get("scoring_reason").map(str::to_string),
        components,
    })
}

/// Web-research findings for one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchDetail {
    pub had_web_research: Option<bool>,
    pub icp_fit_score: Option<f64>,
    pub confidence: Option<String>,
    pub reasoning: Option<String>,
    pub recommendation: Option<String>,
    pub hot_lead_signals: Option<EmbeddedJson>,
    pub concerns: Option<EmbeddedJson>,
    pub timing: Option<EmbeddedJson>,
    pub research_summary: Option<EmbeddedJson>,
    pub primary_contact: Option<EmbeddedJson>,
}

pub fn research_detail(research: Option<&Table>, company_id: &str) -> Option<ResearchDetail> {
    let row = find_company(research?, company_id)?;
    Some(ResearchDetail {
        had_web_research: row.get_bool("had_web_research"),
        icp_fit_score: row.get_f64("icp_fit_score"),
        confidence: row.get("confidence").map(str::to_string),
        reasoning: row.get("reasoning").map(str::to_string),
        recommendation: row.get("recommendation").map(str::to_string),
        hot_lead_signals: EmbeddedJson::parse(row.get("hot_lead_signals")),
        concerns: EmbeddedJson::parse(row.get("concerns")),
        timing: EmbeddedJson::parse(row.get("timing")),
        research_summary: EmbeddedJson::parse(row.get("research_summary")),
        primary_contact: EmbeddedJson::parse(row.get("primary_contact")),
    })
}

/// The full company view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    pub company: CompanyRecord,
    pub hq: HqInfo,
    pub score: Option<ScoreBreakdown>,
    pub buildings: Vec<BuildingRecord>,
    pub penetration_rate: f64,
    pub contacts: Option<ContactSummary>,
    pub churn: Option<ChurnPrediction>,
    pub research: Option<ResearchDetail>,
    pub enrichment: Option<serde_json::Value>,
    pub research_document: Option<serde_json::Value>,
}

/// Use case for assembling a company's detail view
pub struct CompanyDetailUseCase;

impl CompanyDetailUseCase {
    /// `Ok(None)` when the company is not in the companies artifact.
    pub fn load(access: &mut DataAccess, company_id: &str) -> Result<Option<CompanyDetail>> {
        let companies = access.companies()?;
        let Some(company) = find_company(&companies, company_id).map(|r| CompanyRecord::from_row(&r))
        else {
            debug!(company_id = company_id, "Company not found");
            return Ok(None);
        };

        // Downstream lookups and file names use the identifier as the companies artifact spells it
        let company_id = company.company_id.as_str();

        let scored = access.scored_companies()?;
        let buildings = company_buildings(&*access.buildings()?, company_id);
        let contacts = contact_summary(&*access.contacts()?, company_id);

        let churn = access.churn_predictions();
        let research = access.company_research();
        let enrichment = match access.research_enrichment() {
            Ok(enrichment) => enrichment.company(company_id).cloned(),
            Err(e) => {
                warn!(error = %e, "Research enrichment unavailable");
                None
            }
        };
        let research_document = access.research_document(company_id);

        Ok(Some(CompanyDetail {
            hq: HqInfo::from_company(&company),
            score: score_breakdown(&scored, company_id),
            penetration_rate: penetration_rate(&buildings),
            buildings,
            contacts,
            churn: churn_prediction(churn.as_available(), company_id),
            research: research_detail(research.as_available(), company_id),
            enrichment,
            research_document,
            company,
        }))
    }
}
