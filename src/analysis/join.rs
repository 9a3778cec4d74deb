//! Attaches administrative names to mobility rows.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::analysis::utility::to_pct;
use crate::boundary::Boundaries;
use crate::country::Country;
use crate::model::{EnrichedRecord, MobilityRecord};

/// Result of joining one country's rows against its boundaries.
///
/// `records.len() + dropped` equals the number of input rows for the country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Joined {
    pub records: Vec<EnrichedRecord>,
    pub dropped: usize,
    pub unmatched_polygons: BTreeSet<String>,
}

/// Inner-joins `country`'s rows on polygon id and derives percentage metrics.
///
/// Rows of other countries are ignored. Rows whose polygon has no boundary
/// entry are dropped and counted; they cannot be attributed to any unit.
pub fn join(records: &[MobilityRecord], country: Country, boundaries: &Boundaries) -> Joined {
    let mut joined = Joined::default();

    for record in records.iter().filter(|r| r.country_code == country.code()) {
        let (province_name, city_name) = match boundaries {
            Boundaries::PolygonNames => (record.polygon_name.clone(), record.polygon_name.clone()),
            Boundaries::Table(table) => match table.get(&record.polygon_id) {
                Some(entry) => (entry.province_name.clone(), entry.city_name.clone()),
                None => {
                    joined.dropped += 1;
                    joined.unmatched_polygons.insert(record.polygon_id.clone());
                    continue;
                }
            },
        };

        joined.records.push(EnrichedRecord {
            polygon_id: record.polygon_id.clone(),
            date: record.date,
            province_name,
            city_name,
            mobility_change_pct: to_pct(record.mobility_change),
            staying_put_pct: to_pct(record.staying_put),
        });
    }

    if joined.dropped > 0 {
        warn!(
            country = country.code(),
            dropped = joined.dropped,
            polygons = ?joined.unmatched_polygons,
            "Dropped rows without boundary match"
        );
    }
    info!(country = country.code(), rows = joined.records.len(), "Joined mobility rows");

    joined
}
