//! On-disk formats understood by the artifact loaders.
//!
//! Tabular artifacts arrive as CSV or as JSON arrays of flat records; configuration
//! arrives as YAML and documents as JSON. Every read failure becomes a
//! [`DashboardError::Load`] naming the path and the stage that should have produced it.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::domain::{Cell, Table};
use crate::error::{DashboardError, Result};

/// Extensions tried, in order, for tabular artifacts.
pub const TABLE_EXTENSIONS: &[&str] = &["csv", "json"];
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// Tokens read as null, matching what the upstream dataframe tooling writes.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(TableFormat::Csv),
            "json" => Some(TableFormat::Json),
            _ => None,
        }
    }
}

/// Read a tabular artifact, detecting the format from the extension.
pub fn read_table(path: &Path, stage: &str) -> Result<Table> {
    let format = TableFormat::from_path(path).ok_or_else(|| {
        DashboardError::load(path.display().to_string(), stage, "unsupported table format")
    })?;
    let bytes = fs::read(path)
        .map_err(|e| DashboardError::load(path.display().to_string(), stage, e.to_string()))?;
    let name = file_name(path);
    let parsed = match format {
        TableFormat::Csv => parse_csv(&bytes, &name),
        TableFormat::Json => parse_json_records(&bytes, &name),
    };
    parsed.map_err(|reason| DashboardError::load(path.display().to_string(), stage, reason))
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path, stage: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| DashboardError::load(path.display().to_string(), stage, e.to_string()))?;
    serde_yaml::from_str(&content).map_err(|e| {
        DashboardError::load(path.display().to_string(), stage, format!("invalid YAML: {}", e))
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path, stage: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| DashboardError::load(path.display().to_string(), stage, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| {
        DashboardError::load(path.display().to_string(), stage, format!("invalid JSON: {}", e))
    })
}

/// Parse CSV text. Short records are null-padded; a record with more fields than the
/// header is an error.
pub fn parse_csv(bytes: &[u8], name: &str) -> std::result::Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| format!("invalid CSV header: {}", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("invalid CSV record {}: {}", line + 1, e))?;
        if record.len() > columns.len() {
            let line = record.position().map_or(line as u64 + 2, |p| p.line());
            return Err(format!(
                "{} line {}: {} fields but the header has {}",
                name,
                line,
                record.len(),
                columns.len()
            ));
        }
        rows.push(record.iter().map(null_aware).collect());
    }
    Ok(Table::from_rows(name, columns, rows))
}

pub fn parse_json_records(bytes: &[u8], name: &str) -> std::result::Result<Table, String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;
    let records = value
        .as_array()
        .ok_or_else(|| "expected a JSON array of records".to_string())?;

    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let object = record
            .as_object()
            .ok_or_else(|| "expected every JSON record to be an object".to_string())?;
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|record| record.as_object())
        .map(|object| {
            columns
                .iter()
                .map(|column| object.get(column).and_then(json_cell))
                .collect()
        })
        .collect();
    Ok(Table::from_rows(name, columns, rows))
}

fn null_aware(raw: &str) -> Cell {
    if NULL_TOKENS.contains(&raw.trim()) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn json_cell(value: &serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => null_aware(s),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
