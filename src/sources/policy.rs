//! OxCGRT policy stringency parsing.
//!
//! The policy layer is published as two CSV files (the index file and the
//! "with notes" file). Either may carry `StringencyIndex` and any number of
//! `*_Notes` columns, so both are parsed the same way and merged per
//! country-day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use super::parse_date;
use crate::error::{Dataset, FetchError};
use crate::model::PolicyRecord;

const COUNTRY_COLUMN: &str = "CountryCode";
const DATE_COLUMN: &str = "Date";
const STRINGENCY_COLUMN: &str = "StringencyIndex";
const NATIONAL_JURISDICTION: &str = "NAT_TOTAL";

struct PolicyColumns {
    country: usize,
    date: usize,
    stringency: Option<usize>,
    region: Option<usize>,
    jurisdiction: Option<usize>,
    notes: Vec<(usize, String)>,
}

impl PolicyColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, FetchError> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| FetchError::Parse {
                dataset: Dataset::Policy,
                line: 1,
                reason: format!("missing column '{name}'"),
            })
        };

        let stringency = position(STRINGENCY_COLUMN)
            .or_else(|| headers.iter().position(|h| h.starts_with(STRINGENCY_COLUMN)));

        let notes = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.ends_with("Notes"))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        Ok(Self {
            country: required(COUNTRY_COLUMN)?,
            date: required(DATE_COLUMN)?,
            stringency,
            region: position("RegionCode"),
            jurisdiction: position("Jurisdiction"),
            notes,
        })
    }
}

/// Parses one policy file into national country-day records.
///
/// Subnational rows (a non-empty `RegionCode` or a jurisdiction other than
/// `NAT_TOTAL`) are skipped so each country-day appears once.
pub fn parse_policy_file(bytes: &[u8]) -> Result<Vec<PolicyRecord>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = rdr
        .headers()
        .map_err(|e| FetchError::csv(Dataset::Policy, e))?
        .clone();
    let columns = PolicyColumns::from_headers(&headers)?;

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = result.map_err(|e| FetchError::csv(Dataset::Policy, e))?;
        let line = i as u64 + 2;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        if columns.region.is_some_and(|idx| !field(idx).is_empty()) {
            continue;
        }
        if columns
            .jurisdiction
            .is_some_and(|idx| !field(idx).is_empty() && field(idx) != NATIONAL_JURISDICTION)
        {
            continue;
        }

        let date = parse_date(field(columns.date)).ok_or_else(|| FetchError::Parse {
            dataset: Dataset::Policy,
            line,
            reason: format!("invalid date '{}'", field(columns.date)),
        })?;

        let stringency_index = match columns.stringency.map(field) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<f64>().map_err(|_| FetchError::Parse {
                dataset: Dataset::Policy,
                line,
                reason: format!("invalid stringency index '{value}'"),
            })?),
        };

        let notes = columns
            .notes
            .iter()
            .filter(|(idx, _)| !field(*idx).is_empty())
            .map(|(idx, name)| (name.clone(), field(*idx).to_string()))
            .collect();

        records.push(PolicyRecord {
            country_code: field(columns.country).to_string(),
            date,
            stringency_index,
            notes,
        });
    }

    Ok(records)
}

/// Parses and merges all policy files, keyed on (country, date).
///
/// A value already present wins; later files only fill the gaps.
pub fn merge_policy_files(files: &[Vec<u8>]) -> Result<Vec<PolicyRecord>, FetchError> {
    let mut merged: BTreeMap<(String, NaiveDate), PolicyRecord> = BTreeMap::new();

    for bytes in files {
        for record in parse_policy_file(bytes)? {
            let key = (record.country_code.clone(), record.date);
            match merged.get_mut(&key) {
                Some(existing) => {
                    if existing.stringency_index.is_none() {
                        existing.stringency_index = record.stringency_index;
                    }
                    for (category, note) in record.notes {
                        existing.notes.entry(category).or_insert(note);
                    }
                }
                None => {
                    merged.insert(key, record);
                }
            }
        }
    }

    info!(rows = merged.len(), files = files.len(), "Merged policy files");
    Ok(merged.into_values().collect())
}
