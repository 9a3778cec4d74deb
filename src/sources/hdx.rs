//! Resolves the current Movement Range archive URL from the HDX catalog.

use serde_json::Value;
use tracing::info;

use crate::error::{Dataset, FetchError};
use crate::fetch::{HttpClient, fetch_bytes};

pub const HDX_PACKAGE_URL: &str =
    "https://data.humdata.org/api/3/action/package_show?id=movement-range-maps";

/// Queries the CKAN `package_show` endpoint and picks the data archive.
pub async fn resolve_archive_url<C: HttpClient>(
    client: &C,
    package_url: &str,
) -> Result<String, FetchError> {
    let bytes = fetch_bytes(client, Dataset::Mobility, package_url).await?;

    let json: Value = serde_json::from_slice(&bytes).map_err(|e| FetchError::Resolve {
        dataset: Dataset::Mobility,
        reason: format!("failed to parse package response: {e}"),
    })?;

    let url = archive_url_from_package(&json).ok_or_else(|| FetchError::Resolve {
        dataset: Dataset::Mobility,
        reason: "package lists no movement range archive".to_string(),
    })?;

    info!(%url, "Resolved movement range archive");
    Ok(url)
}

/// Extracts the archive URL from a `package_show` response.
///
/// Prefers the zip resource whose URL mentions `movement-range-data`; older
/// packages listed the archive as the second resource.
pub fn archive_url_from_package(json: &Value) -> Option<String> {
    let resources = json["result"]["resources"].as_array()?;
    let download_url = |resource: &Value| {
        resource["download_url"]
            .as_str()
            .or_else(|| resource["url"].as_str())
            .map(str::to_string)
    };

    resources
        .iter()
        .filter_map(download_url)
        .find(|url| url.contains("movement-range-data") && url.ends_with(".zip"))
        .or_else(|| resources.get(1).and_then(download_url))
}
