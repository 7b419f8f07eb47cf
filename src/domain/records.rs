use serde::Serialize;

use super::keys::SegmentCode;
use super::table::Row;
use crate::constants::{is_served_source, SOURCE_DATAAXLE};

/// Typed view of a row of the companies artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRecord {
    pub company_id: String,
    pub name: Option<String>,
    pub primary_naics: Option<SegmentCode>,
    pub hq_latitude: Option<f64>,
    pub hq_longitude: Option<f64>,
    pub building_count: Option<i64>,
    pub employees: Option<f64>,
    pub sales_volume: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl CompanyRecord {
    pub fn from_row(row: &Row<'_>) -> Self {
        Self {
            company_id: row.get("company_id").unwrap_or_default().to_string(),
            name: row.get("name").map(str::to_string),
            primary_naics: row.get("primary_naics").and_then(SegmentCode::parse),
            hq_latitude: row.get_f64("hq_latitude"),
            hq_longitude: row.get_f64("hq_longitude"),
            building_count: row.get_i64("building_count"),
            // Employee size and revenue moved between columns across extraction versions
            employees: row
                .get_f64("location_employee_size")
                .or_else(|| row.get_f64("employees")),
            sales_volume: row
                .get_f64("sales_volume")
                .or_else(|| row.get_f64("corporate_sales_revenue"))
                .or_else(|| row.get_f64("revenue")),
            city: row.get("city").map(str::to_string),
            state: row.get("state").map(str::to_string),
        }
    }

    pub fn hq_coordinates(&self) -> Option<(f64, f64)> {
        self.hq_latitude.zip(self.hq_longitude)
    }
}

/// Typed view of a row of the buildings artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingRecord {
    pub building_id: String,
    pub company_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: String,
    pub is_served: bool,
    pub square_footage: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl BuildingRecord {
    pub fn from_row(row: &Row<'_>) -> Self {
        let source = row.get("source").unwrap_or(SOURCE_DATAAXLE).to_string();
        let is_served = row
            .get_bool("is_served")
            .unwrap_or_else(|| is_served_source(&source));
        Self {
            building_id: row.get("building_id").unwrap_or_default().to_string(),
            company_id: row.get("company_id").unwrap_or_default().to_string(),
            latitude: row.get_f64("latitude"),
            longitude: row.get_f64("longitude"),
            source,
            is_served,
            square_footage: row.get_f64("square_footage"),
            city: row.get("city").map(str::to_string),
            state: row.get("state").map(str::to_string),
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
