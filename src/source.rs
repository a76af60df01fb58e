/*!
 * Reading raw provider records from JSON
 *
 * The endpoint serves a single JSON array of provider objects. The same
 * document can be saved to disk and loaded from a file for offline use.
 */

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use crate::{Result, DirectoryError, ErrorContext};
use crate::data_types::RawProviderRecord;

/// Parse raw records from a JSON string
pub fn parse_raw_catalog(json: &str) -> Result<Vec<RawProviderRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Read raw records from any reader
pub fn read_raw_catalog<R: Read>(reader: R) -> Result<Vec<RawProviderRecord>> {
    Ok(serde_json::from_reader(BufReader::new(reader))?)
}

/// Read raw records from a JSON file
pub fn read_raw_catalog_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawProviderRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DirectoryError::file_not_found_with_suggestion(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| DirectoryError::Io {
        message: format!("Failed to open {}: {}", path.display(), e),
        source: e,
        context: ErrorContext {
            file_path: Some(path.to_path_buf()),
        },
    })?;

    let records = read_raw_catalog(file)?;
    info!(path = %path.display(), records = records.len(), "read raw provider catalog");
    Ok(records)
}
