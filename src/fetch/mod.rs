mod basic;
mod client;
pub mod decode;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Dataset, FetchError};

/// Loads a dataset payload from an `http(s)` URL or a local file path.
#[tracing::instrument(skip(client), fields(%dataset))]
pub async fn load_bytes<C: HttpClient>(
    client: &C,
    dataset: Dataset,
    location: &str,
) -> Result<Bytes, FetchError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        fetch_bytes(client, dataset, location).await
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| FetchError::Io {
                dataset,
                path: path.into(),
                source,
            })?;
        debug!(path, bytes = bytes.len(), "Read local source");
        Ok(Bytes::from(bytes))
    }
}

/// Issues a GET for `url`, mapping transport failures onto [`FetchError`].
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    dataset: Dataset,
    url: &str,
) -> Result<Bytes, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        dataset,
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let http_error = |source: reqwest::Error| {
        if source.is_timeout() {
            FetchError::Timeout {
                dataset,
                url: url.to_string(),
            }
        } else {
            FetchError::Http {
                dataset,
                url: url.to_string(),
                source,
            }
        }
    };

    let resp = client.execute(req).await.map_err(http_error)?;
    if !resp.status().is_success() {
        return Err(FetchError::Status {
            dataset,
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }

    let bytes = resp.bytes().await.map_err(http_error)?;
    debug!(url, bytes = bytes.len(), "Fetched remote source");
    Ok(bytes)
}
