//! Per-country administrative boundary lookups.
//!
//! Boundary tables are flat CSV exports of the GADM attribute tables, stored
//! as `<dir>/<CODE>/adm1.csv` and `<dir>/<CODE>/adm2.csv`. Districts (adm2)
//! are joined to their province (adm1) on `GID_1`. Province and city names
//! are then read from the columns named by the country's profile.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::country::Country;
use crate::error::{JoinError, PipelineError};
use crate::model::BoundaryEntry;

const PROVINCE_ID: &str = "GID_1";
const DISTRICT_ID: &str = "GID_2";

pub type BoundaryMap = HashMap<String, BoundaryEntry>;

/// Resolved names for one country's polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundaries {
    /// polygon_id to names, loaded from the boundary tables.
    Table(BoundaryMap),
    /// The feed's own `polygon_name` labels each polygon.
    PolygonNames,
}

pub struct BoundaryResolver {
    dir: PathBuf,
}

impl BoundaryResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolves boundaries for a country code such as `"VNM"`.
    pub fn resolve(&self, country_code: &str) -> Result<Boundaries, PipelineError> {
        let country: Country = country_code.parse()?;
        Ok(self.resolve_country(country)?)
    }

    #[tracing::instrument(skip(self), fields(country = country.code()))]
    pub fn resolve_country(&self, country: Country) -> Result<Boundaries, JoinError> {
        if country.uses_polygon_names() {
            debug!("Using feed polygon names");
            return Ok(Boundaries::PolygonNames);
        }

        let country_dir = self.dir.join(country.code());
        let adm1_path = country_dir.join("adm1.csv");
        let adm2_path = country_dir.join("adm2.csv");

        let table = build_table(
            country,
            &adm1_path.display().to_string(),
            open(&adm1_path)?,
            &adm2_path.display().to_string(),
            open(&adm2_path)?,
        )?;

        info!(polygons = table.len(), "Loaded boundary table");
        Ok(Boundaries::Table(table))
    }
}

fn open(path: &Path) -> Result<File, JoinError> {
    File::open(path).map_err(|source| JoinError::MissingTable {
        path: path.to_path_buf(),
        source,
    })
}

struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

impl Table {
    fn read(name: &str, reader: impl Read) -> Result<Self, JoinError> {
        let table_error = |source| JoinError::Table {
            table: name.to_string(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(table_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(table_error)?;
            rows.push(
                headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect(),
            );
        }

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    fn require(&self, column: &str) -> Result<(), JoinError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(JoinError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }
}

/// Joins the adm1 and adm2 tables into a polygon lookup for `country`.
pub fn build_table(
    country: Country,
    adm1_name: &str,
    adm1: impl Read,
    adm2_name: &str,
    adm2: impl Read,
) -> Result<BoundaryMap, JoinError> {
    let profile = country.profile();
    let adm1 = Table::read(adm1_name, adm1)?;
    let adm2 = Table::read(adm2_name, adm2)?;

    adm1.require(PROVINCE_ID)?;
    adm2.require(PROVINCE_ID)?;
    adm2.require(DISTRICT_ID)?;
    for column in [profile.province_column, profile.city_column] {
        if !adm1.has_column(column) {
            adm2.require(column)?;
        }
    }

    let provinces: HashMap<&str, &HashMap<String, String>> = adm1
        .rows
        .iter()
        .filter_map(|row| row.get(PROVINCE_ID).map(|id| (id.as_str(), row)))
        .collect();

    let mut table = BoundaryMap::with_capacity(adm2.rows.len());
    for district in &adm2.rows {
        let polygon_id = district.get(DISTRICT_ID).cloned().unwrap_or_default();
        let province_id = district.get(PROVINCE_ID).cloned().unwrap_or_default();

        let province = provinces
            .get(province_id.as_str())
            .ok_or_else(|| JoinError::UnknownProvince {
                country: profile.code,
                polygon_id: polygon_id.clone(),
                province_id: province_id.clone(),
            })?;

        let name = |column: &str| {
            district
                .get(column)
                .or_else(|| province.get(column))
                .cloned()
                .unwrap_or_default()
        };

        table.insert(
            polygon_id.clone(),
            BoundaryEntry {
                polygon_id,
                province_name: name(profile.province_column),
                city_name: name(profile.city_column),
                country_code: profile.code.to_string(),
            },
        );
    }

    if table.is_empty() {
        return Err(JoinError::EmptyTable {
            country: profile.code,
        });
    }

    Ok(table)
}
