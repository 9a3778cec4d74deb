//! Curated typhoon and flood event list.

use serde::Deserialize;
use tracing::info;

use super::parse_date;
use crate::error::{Dataset, FetchError};
use crate::model::DisasterEvent;

#[derive(Debug, Deserialize)]
struct RawEvent {
    country: String,
    #[serde(alias = "area", alias = "province_or_area")]
    province: String,
    start_date: String,
    end_date: String,
    #[serde(alias = "name")]
    label: String,
}

pub fn parse_events(bytes: &[u8]) -> Result<Vec<DisasterEvent>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let mut events = Vec::new();

    for (i, result) in rdr.deserialize::<RawEvent>().enumerate() {
        let raw = result.map_err(|e| FetchError::csv(Dataset::Typhoons, e))?;
        let line = i as u64 + 2;
        let date = |value: &str| {
            parse_date(value).ok_or_else(|| FetchError::Parse {
                dataset: Dataset::Typhoons,
                line,
                reason: format!("invalid date '{value}'"),
            })
        };

        let start_date = date(&raw.start_date)?;
        let end_date = date(&raw.end_date)?;
        if end_date < start_date {
            return Err(FetchError::Parse {
                dataset: Dataset::Typhoons,
                line,
                reason: format!("{} ends before it starts", raw.label),
            });
        }

        events.push(DisasterEvent {
            country: raw.country,
            province_or_area: raw.province,
            start_date,
            end_date,
            label: raw.label,
        });
    }

    info!(events = events.len(), "Parsed disaster events");
    Ok(events)
}
