//! Error types for fetching, boundary resolution and the pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The remote datasets the pipeline pulls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Mobility,
    Policy,
    Typhoons,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dataset::Mobility => "mobility",
            Dataset::Policy => "policy",
            Dataset::Typhoons => "typhoons",
        };
        f.write_str(name)
    }
}

/// Failure to retrieve or decode one dataset.
///
/// Every variant names the [`Dataset`] so callers can degrade just that layer.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{dataset}: invalid url {url}: {reason}")]
    InvalidUrl {
        dataset: Dataset,
        url: String,
        reason: String,
    },

    #[error("{dataset}: request to {url} failed")]
    Http {
        dataset: Dataset,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{dataset}: request to {url} timed out")]
    Timeout { dataset: Dataset, url: String },

    #[error("{dataset}: {url} returned status {status}")]
    Status {
        dataset: Dataset,
        url: String,
        status: u16,
    },

    #[error("{dataset}: failed to read {path}")]
    Io {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{dataset}: malformed zip archive")]
    Archive {
        dataset: Dataset,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{dataset}: archive has no entry matching '{pattern}'")]
    MissingEntry { dataset: Dataset, pattern: String },

    #[error("{dataset}: failed to decompress payload")]
    Decompress {
        dataset: Dataset,
        #[source]
        source: std::io::Error,
    },

    #[error("{dataset}: malformed csv")]
    Csv {
        dataset: Dataset,
        #[source]
        source: csv::Error,
    },

    #[error("{dataset}: line {line}: {reason}")]
    Parse {
        dataset: Dataset,
        line: u64,
        reason: String,
    },

    #[error("{dataset}: could not resolve download url: {reason}")]
    Resolve { dataset: Dataset, reason: String },
}

impl FetchError {
    pub fn dataset(&self) -> Dataset {
        match self {
            FetchError::InvalidUrl { dataset, .. }
            | FetchError::Http { dataset, .. }
            | FetchError::Timeout { dataset, .. }
            | FetchError::Status { dataset, .. }
            | FetchError::Io { dataset, .. }
            | FetchError::Archive { dataset, .. }
            | FetchError::MissingEntry { dataset, .. }
            | FetchError::Decompress { dataset, .. }
            | FetchError::Csv { dataset, .. }
            | FetchError::Parse { dataset, .. }
            | FetchError::Resolve { dataset, .. } => *dataset,
        }
    }

    pub(crate) fn csv(dataset: Dataset, source: csv::Error) -> Self {
        FetchError::Csv { dataset, source }
    }
}

/// A country code or name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported country '{0}'")]
pub struct UnknownCountryError(pub String);

/// Boundary tables for a supported country could not be loaded or joined.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("failed to open boundary table {path}")]
    MissingTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed boundary table {table}")]
    Table {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("boundary table {table} has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("{country}: district {polygon_id} references unknown province {province_id}")]
    UnknownProvince {
        country: &'static str,
        polygon_id: String,
        province_id: String,
    },

    #[error("boundary table for {country} is empty")]
    EmptyTable { country: &'static str },
}

/// Errors that stop a pipeline run for the requested country.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnknownCountry(#[from] UnknownCountryError),

    #[error("boundary resolution failed")]
    Join(#[from] JoinError),

    #[error("mobility data unavailable")]
    Fetch(#[from] FetchError),
}
