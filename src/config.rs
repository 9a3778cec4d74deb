//! Runtime configuration, read from the environment or a JSON file.
//!
//! Environment keys (all optional):
//!
//! | Key                  | Default                              |
//! |----------------------|--------------------------------------|
//! | `MOBILITY_URL`       | resolved through the HDX catalog     |
//! | `HDX_PACKAGE_URL`    | HDX `movement-range-maps` package    |
//! | `POLICY_URLS`        | OxCGRT latest + with-notes CSVs      |
//! | `TYPHOON_URL`        | `data/typhoons.csv`                  |
//! | `BOUNDARY_DIR`       | `boundaries`                         |
//! | `FETCH_TIMEOUT_SECS` | `120`                                |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::sources::hdx::HDX_PACKAGE_URL;

pub const DEFAULT_POLICY_URLS: [&str; 2] = [
    "https://raw.githubusercontent.com/OxCGRT/covid-policy-tracker/master/data/OxCGRT_latest.csv",
    "https://raw.githubusercontent.com/OxCGRT/covid-policy-tracker/master/data/OxCGRT_latest_withnotes.csv",
];
pub const DEFAULT_TYPHOON_URL: &str = "data/typhoons.csv";
pub const DEFAULT_BOUNDARY_DIR: &str = "boundaries";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// Where each dataset is loaded from. Entries may be URLs or local paths.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceLocations {
    #[serde(default)]
    pub mobility_url: Option<String>,
    #[serde(default = "default_hdx_package_url")]
    pub hdx_package_url: String,
    #[serde(default = "default_policy_urls")]
    pub policy_urls: Vec<String>,
    #[serde(default = "default_typhoon_url")]
    pub typhoon_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub sources: SourceLocations,
    #[serde(default = "default_boundary_dir")]
    pub boundary_dir: PathBuf,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Config {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let policy_urls = match get("POLICY_URLS") {
            Some(urls) => urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
            None => default_policy_urls(),
        };

        let fetch_timeout_secs = match get("FETCH_TIMEOUT_SECS") {
            Some(secs) => secs
                .trim()
                .parse()
                .with_context(|| format!("FETCH_TIMEOUT_SECS must be an integer, got '{secs}'"))?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Ok(Self {
            sources: SourceLocations {
                mobility_url: get("MOBILITY_URL"),
                hdx_package_url: get("HDX_PACKAGE_URL").unwrap_or_else(default_hdx_package_url),
                policy_urls,
                typhoon_url: get("TYPHOON_URL").unwrap_or_else(default_typhoon_url),
            },
            boundary_dir: get("BOUNDARY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_boundary_dir),
            fetch_timeout_secs,
        })
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_hdx_package_url() -> String {
    HDX_PACKAGE_URL.to_string()
}

fn default_policy_urls() -> Vec<String> {
    DEFAULT_POLICY_URLS.iter().map(|u| u.to_string()).collect()
}

fn default_typhoon_url() -> String {
    DEFAULT_TYPHOON_URL.to_string()
}

fn default_boundary_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BOUNDARY_DIR)
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.sources.mobility_url, None);
        assert_eq!(config.sources.hdx_package_url, HDX_PACKAGE_URL);
        assert_eq!(config.sources.policy_urls.len(), 2);
        assert_eq!(config.sources.typhoon_url, DEFAULT_TYPHOON_URL);
        assert_eq!(config.boundary_dir, PathBuf::from("boundaries"));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MOBILITY_URL", "/tmp/movement.zip"),
            ("POLICY_URLS", "a.csv, b.csv,"),
            ("FETCH_TIMEOUT_SECS", "15"),
            ("BOUNDARY_DIR", "/srv/boundaries"),
        ]);
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.sources.mobility_url.as_deref(), Some("/tmp/movement.zip"));
        assert_eq!(config.sources.policy_urls, vec!["a.csv", "b.csv"]);
        assert_eq!(config.fetch_timeout_secs, 15);
        assert_eq!(config.boundary_dir, PathBuf::from("/srv/boundaries"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let result = Config::from_lookup(|k| (k == "FETCH_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "mobility_url": "movement.zip", "typhoon_url": "events.csv", "fetch_timeout_secs": 30 }"#,
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.sources.mobility_url.as_deref(), Some("movement.zip"));
        assert_eq!(config.sources.typhoon_url, "events.csv");
        assert_eq!(config.sources.policy_urls.len(), 2);
        assert_eq!(config.fetch_timeout_secs, 30);
    }
}
