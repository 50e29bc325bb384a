use std::fs;
use std::path::{Path, PathBuf};

use changeplan_core::ReleaseManifest;

use crate::Result;
use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "release-manifest.json";

/// Pretty-printed JSON for `manifest`, newline terminated. `path` names the
/// destination in errors.
///
/// # Errors
///
/// Returns `ManifestError::Serialize` if the manifest cannot be encoded.
pub fn serialize_manifest(manifest: &ReleaseManifest, path: &Path) -> Result<String> {
    let mut contents =
        serde_json::to_string_pretty(manifest).map_err(|source| ManifestError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    contents.push('\n');
    Ok(contents)
}

/// Writes `release-manifest.json` into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns `ManifestError::Write` if the directory or file cannot be written.
pub fn write_manifest(dir: &Path, manifest: &ReleaseManifest) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE);

    fs::create_dir_all(dir).map_err(|source| ManifestError::Write {
        path: path.clone(),
        source,
    })?;

    let contents = serialize_manifest(manifest, &path)?;

    fs::write(&path, contents).map_err(|source| ManifestError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        packages = manifest.packages.len(),
        "wrote release manifest"
    );
    Ok(path)
}
