// Domain data shapes shared across layers

pub mod keys;
pub mod records;
pub mod scoring;
pub mod table;

pub use keys::{CompanyKey, SegmentCode};
pub use records::{BuildingRecord, CompanyRecord};
pub use scoring::{ScoredTable, ScoringVariant};
pub use table::{Cell, Row, Table};

use serde::Serialize;

/// Result of loading an optional artifact.
///
/// Absence is a valid state the display layer renders, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Availability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Unavailable(_) => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Availability::Available(_) => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }
}

/// A cell that may carry JSON-encoded text.
///
/// Parsing never fails: text that is not valid JSON is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EmbeddedJson {
    Parsed(serde_json::Value),
    Raw(String),
}

impl EmbeddedJson {
    /// `None` for null or blank cells.
    pub fn parse(cell: Option<&str>) -> Option<Self> {
        let text = cell?.trim();
        if text.is_empty() {
            return None;
        }
        Some(match serde_json::from_str(text) {
            Ok(value) => EmbeddedJson::Parsed(value),
            Err(_) => EmbeddedJson::Raw(text.to_string()),
        })
    }

    pub fn as_parsed(&self) -> Option<&serde_json::Value> {
        match self {
            EmbeddedJson::Parsed(value) => Some(value),
            EmbeddedJson::Raw(_) => None,
        }
    }
}
