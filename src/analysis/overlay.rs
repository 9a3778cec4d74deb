//! Policy stringency and disaster event overlays.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::country::Country;
use crate::model::{DisasterEvent, PolicyRecord, SeriesPoint};

/// How series points without a policy row on the same date are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolicyJoin {
    /// Keep the point with no stringency value.
    #[default]
    Left,
    /// Drop points whose date has no policy row.
    Inner,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub series: Vec<SeriesPoint>,
    pub events: Vec<DisasterEvent>,
    /// Series points with no policy row for their date.
    pub unmatched_dates: usize,
}

/// Joins policy data onto `series` by date and selects the relevant events.
///
/// Events are kept when they belong to `country` and name one of
/// `provinces` (case-insensitive).
pub fn overlay(
    series: Vec<SeriesPoint>,
    policy: &[PolicyRecord],
    events: &[DisasterEvent],
    country: Country,
    provinces: &BTreeSet<String>,
    join: PolicyJoin,
) -> Overlay {
    let by_date: HashMap<NaiveDate, &PolicyRecord> = policy
        .iter()
        .filter(|p| p.country_code == country.code())
        .map(|p| (p.date, p))
        .collect();

    let mut unmatched_dates = 0usize;
    let mut joined = Vec::with_capacity(series.len());
    for mut point in series {
        match by_date.get(&point.date) {
            Some(record) => {
                point.stringency_index = record.stringency_index;
                point.overlay_notes = notes_text(record);
                joined.push(point);
            }
            None => {
                unmatched_dates += 1;
                if join == PolicyJoin::Left {
                    joined.push(point);
                }
            }
        }
    }

    if unmatched_dates > 0 {
        match join {
            PolicyJoin::Inner => warn!(
                dropped = unmatched_dates,
                "Dropped series points without policy data"
            ),
            PolicyJoin::Left => info!(
                unmatched = unmatched_dates,
                "Series points without policy data"
            ),
        }
    }

    let wanted: BTreeSet<String> = provinces.iter().map(|p| p.to_lowercase()).collect();
    let events: Vec<DisasterEvent> = events
        .iter()
        .filter(|e| country.matches(&e.country))
        .filter(|e| wanted.contains(&e.province_or_area.trim().to_lowercase()))
        .cloned()
        .collect();

    Overlay {
        series: joined,
        events,
        unmatched_dates,
    }
}

fn notes_text(record: &PolicyRecord) -> Option<String> {
    let parts: Vec<String> = record
        .notes
        .iter()
        .filter(|(_, note)| !note.trim().is_empty())
        .map(|(category, note)| format!("{category}: {}", note.trim()))
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}
