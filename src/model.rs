//! Records flowing through the pipeline, from raw feed rows to chart points.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One polygon-day row of the Movement Range feed.
///
/// The two metrics are kept as the raw fractions published by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MobilityRecord {
    pub country_code: String,
    pub polygon_id: String,
    pub polygon_name: String,
    pub date: NaiveDate,
    pub mobility_change: f64,
    pub staying_put: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryEntry {
    pub polygon_id: String,
    pub province_name: String,
    pub city_name: String,
    pub country_code: String,
}

/// Policy stringency for one country-day, with free-text notes per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRecord {
    pub country_code: String,
    pub date: NaiveDate,
    pub stringency_index: Option<f64>,
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterEvent {
    pub country: String,
    pub province_or_area: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub label: String,
}

/// A mobility row labelled with its administrative names and percentage metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub polygon_id: String,
    pub date: NaiveDate,
    pub province_name: String,
    pub city_name: String,
    pub mobility_change_pct: f64,
    pub staying_put_pct: f64,
}

/// Which Movement Range metric a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    MobilityChange,
    StayingPut,
}

impl Metric {
    pub fn value(&self, record: &EnrichedRecord) -> f64 {
        match self {
            Metric::MobilityChange => record.mobility_change_pct,
            Metric::StayingPut => record.staying_put_pct,
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobility-change" | "mobility" => Ok(Metric::MobilityChange),
            "staying-put" | "staying" => Ok(Metric::StayingPut),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// One row of the final series handed to presentation or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub unit_label: String,
    pub date: NaiveDate,
    /// Empty for a resampled bucket that received no rows.
    pub metric_value: Option<f64>,
    pub stringency_index: Option<f64>,
    pub overlay_notes: Option<String>,
}

impl SeriesPoint {
    pub fn new(unit_label: impl Into<String>, date: NaiveDate, metric_value: f64) -> Self {
        Self {
            unit_label: unit_label.into(),
            date,
            metric_value: Some(metric_value),
            stringency_index: None,
            overlay_notes: None,
        }
    }

    /// A point for a date with no underlying rows.
    pub fn gap(unit_label: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            unit_label: unit_label.into(),
            date,
            metric_value: None,
            stringency_index: None,
            overlay_notes: None,
        }
    }
}
