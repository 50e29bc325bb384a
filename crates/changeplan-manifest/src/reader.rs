use std::fs;
use std::path::Path;

use changeplan_core::{ReleaseManifest, SCHEMA_VERSION};
use serde::Deserialize;

use crate::Result;
use crate::error::ManifestError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaProbe {
    schema_version: String,
}

/// Reads a manifest written by [`write_manifest`](crate::write_manifest).
///
/// # Errors
///
/// Returns `ManifestError::UnsupportedSchema` if the file declares a schema
/// version other than the supported one, and `Read`/`Parse` errors otherwise.
pub fn read_manifest(path: &Path) -> Result<ReleaseManifest> {
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let probe: SchemaProbe =
        serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if probe.schema_version != SCHEMA_VERSION {
        return Err(ManifestError::UnsupportedSchema {
            path: path.to_path_buf(),
            found: probe.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    serde_json::from_str(&contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
