//! Remote dataset fetchers.
//!
//! [`DatasetFetcher`] is the seam the pipeline and cache depend on.
//! [`RemoteFetcher`] implements it over any [`HttpClient`], resolving the
//! mobility archive through HDX when no explicit URL is configured.

pub mod hdx;
pub mod mobility;
pub mod policy;
pub mod typhoons;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::config::SourceLocations;
use crate::country::Country;
use crate::error::{Dataset, FetchError};
use crate::fetch::{HttpClient, decode, load_bytes};
use crate::model::{DisasterEvent, MobilityRecord, PolicyRecord};

/// Retrieves the three datasets the dashboard is built from.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    async fn fetch_mobility(&self) -> Result<Vec<MobilityRecord>, FetchError>;
    async fn fetch_policy(&self) -> Result<Vec<PolicyRecord>, FetchError>;
    async fn fetch_typhoons(&self) -> Result<Vec<DisasterEvent>, FetchError>;
}

pub struct RemoteFetcher<C> {
    client: C,
    locations: SourceLocations,
    countries: Vec<Country>,
}

impl<C: HttpClient> RemoteFetcher<C> {
    pub fn new(client: C, locations: SourceLocations) -> Self {
        Self {
            client,
            locations,
            countries: Country::ALL.to_vec(),
        }
    }

    /// Restricts the mobility feed to `countries`; the global feed is large.
    pub fn with_countries(mut self, countries: Vec<Country>) -> Self {
        self.countries = countries;
        self
    }

    async fn mobility_location(&self) -> Result<String, FetchError> {
        match &self.locations.mobility_url {
            Some(url) => Ok(url.clone()),
            None => hdx::resolve_archive_url(&self.client, &self.locations.hdx_package_url).await,
        }
    }
}

#[async_trait]
impl<C: HttpClient> DatasetFetcher for RemoteFetcher<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_mobility(&self) -> Result<Vec<MobilityRecord>, FetchError> {
        let location = self.mobility_location().await?;
        info!(%location, "Downloading movement range archive");
        let bytes = load_bytes(&self.client, Dataset::Mobility, &location).await?;
        let raw = decode::unpack(Dataset::Mobility, &bytes, Some(mobility::ARCHIVE_ENTRY))?;
        mobility::parse_movement_range(&raw, &self.countries)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_policy(&self) -> Result<Vec<PolicyRecord>, FetchError> {
        let mut files = Vec::with_capacity(self.locations.policy_urls.len());
        for location in &self.locations.policy_urls {
            info!(%location, "Downloading policy file");
            let bytes = load_bytes(&self.client, Dataset::Policy, location).await?;
            files.push(decode::unpack(Dataset::Policy, &bytes, None)?);
        }
        policy::merge_policy_files(&files)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_typhoons(&self) -> Result<Vec<DisasterEvent>, FetchError> {
        let location = &self.locations.typhoon_url;
        let bytes = load_bytes(&self.client, Dataset::Typhoons, location).await?;
        let raw = decode::unpack(Dataset::Typhoons, &bytes, None)?;
        typhoons::parse_events(&raw)
    }
}

/// Parses `YYYY-MM-DD` or the compact `YYYYMMDD` used by OxCGRT.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}
