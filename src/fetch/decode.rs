//! Payload unpacking: zip archives, gzip streams, or plain text.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{Dataset, FetchError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Returns the raw CSV bytes contained in `bytes`.
///
/// Zip archives yield the first file entry whose name contains
/// `entry_pattern` (or the first file when no pattern is given).
pub fn unpack(
    dataset: Dataset,
    bytes: &[u8],
    entry_pattern: Option<&str>,
) -> Result<Vec<u8>, FetchError> {
    if bytes.starts_with(ZIP_MAGIC) {
        unzip(dataset, bytes, entry_pattern)
    } else if bytes.starts_with(GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|source| FetchError::Decompress { dataset, source })?;
        debug!(%dataset, compressed = bytes.len(), inflated = out.len(), "Gunzipped payload");
        Ok(out)
    } else {
        Ok(bytes.to_vec())
    }
}

fn unzip(
    dataset: Dataset,
    bytes: &[u8],
    entry_pattern: Option<&str>,
) -> Result<Vec<u8>, FetchError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|source| FetchError::Archive { dataset, source })?;

    let name = archive
        .file_names()
        .find(|name| !name.ends_with('/') && entry_pattern.is_none_or(|p| name.contains(p)))
        .map(str::to_owned)
        .ok_or_else(|| FetchError::MissingEntry {
            dataset,
            pattern: entry_pattern.unwrap_or("*").to_string(),
        })?;

    let mut file = archive
        .by_name(&name)
        .map_err(|source| FetchError::Archive { dataset, source })?;
    debug!(%dataset, entry = file.name(), size = file.size(), "Extracting archive entry");

    let mut out = Vec::new();
    file.read_to_end(&mut out)
        .map_err(|source| FetchError::Decompress { dataset, source })?;
    Ok(out)
}
