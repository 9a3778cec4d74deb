//! Movement Range Maps feed parsing.

use serde::Deserialize;
use tracing::{debug, info};

use super::parse_date;
use crate::country::Country;
use crate::error::{Dataset, FetchError};
use crate::model::MobilityRecord;

/// Substring identifying the data file inside the HDX archive.
pub const ARCHIVE_ENTRY: &str = "movement";

#[derive(Debug, Deserialize)]
struct RawMovementRow {
    ds: String,
    country: String,
    polygon_id: String,
    #[serde(default)]
    polygon_name: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    all_day_bing_tiles_visited_relative_change: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    all_day_ratio_single_tile_users: Option<f64>,
}

/// Parses the tab-separated feed, keeping rows for `countries` only.
///
/// Rows with a non-numeric metric (`NA` in the published files) are skipped.
/// Output is sorted by polygon then date.
pub fn parse_movement_range(
    bytes: &[u8],
    countries: &[Country],
) -> Result<Vec<MobilityRecord>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut other_countries = 0usize;

    for (i, result) in rdr.deserialize::<RawMovementRow>().enumerate() {
        let row = result.map_err(|e| FetchError::csv(Dataset::Mobility, e))?;

        if !countries.iter().any(|c| c.code() == row.country) {
            other_countries += 1;
            continue;
        }

        let date = parse_date(&row.ds).ok_or_else(|| FetchError::Parse {
            dataset: Dataset::Mobility,
            line: i as u64 + 2,
            reason: format!("invalid date '{}'", row.ds),
        })?;

        let (Some(mobility_change), Some(staying_put)) = (
            row.all_day_bing_tiles_visited_relative_change,
            row.all_day_ratio_single_tile_users,
        ) else {
            skipped += 1;
            continue;
        };

        records.push(MobilityRecord {
            country_code: row.country,
            polygon_id: row.polygon_id,
            polygon_name: row.polygon_name,
            date,
            mobility_change,
            staying_put,
        });
    }

    records.sort_by(|a, b| a.polygon_id.cmp(&b.polygon_id).then(a.date.cmp(&b.date)));

    debug!(other_countries, "Discarded rows outside supported countries");
    info!(rows = records.len(), skipped, "Parsed movement range feed");
    Ok(records)
}
