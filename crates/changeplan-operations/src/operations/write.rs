use std::io::Write as _;
use std::path::{Path, PathBuf};

use changeplan_changelog::ChangelogDocument;
use changeplan_core::ReleaseManifest;
use changeplan_manifest::{MANIFEST_FILE, serialize_manifest, with_integrity};
use tempfile::NamedTempFile;

use super::RenderedChangelogs;
use crate::Result;
use crate::error::OperationError;

pub const WORKSPACE_CHANGELOG: &str = "CHANGELOG.md";

#[must_use]
pub fn package_changelog_name(package: &str) -> String {
    format!("CHANGELOG-{package}.md")
}

/// Files produced by [`write_release`].
#[derive(Debug, Clone)]
pub struct WrittenRelease {
    pub manifest_path: PathBuf,
    /// Package changelogs in manifest order, then the workspace changelog.
    pub changelogs: Vec<PathBuf>,
    /// The manifest as written, including integrity entries.
    pub manifest: ReleaseManifest,
}

/// Prepends each rendered section to its changelog in `dir`, then writes the
/// manifest with a digest of every changelog's full contents.
///
/// Every file is rendered and staged in `dir` before any target is replaced.
/// Staged files are then moved into place with the manifest last, so a
/// manifest on disk never describes changelogs that were not written.
/// Existing changelog files keep their earlier releases.
///
/// # Errors
///
/// Returns an error if `dir` cannot be created, a changelog cannot be read,
/// a target is not a regular file or a file cannot be staged or moved into
/// place. Failures before the first move leave every target untouched.
pub fn write_release(
    dir: &Path,
    manifest: ReleaseManifest,
    changelogs: &RenderedChangelogs,
) -> Result<WrittenRelease> {
    std::fs::create_dir_all(dir).map_err(|source| OperationError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let targets = changelogs
        .packages
        .iter()
        .map(|(package, rendered)| (package_changelog_name(package), rendered.as_str()))
        .chain(std::iter::once((
            WORKSPACE_CHANGELOG.to_string(),
            changelogs.workspace.as_str(),
        )));

    let mut artifacts = Vec::new();
    for (file_name, rendered) in targets {
        let path = dir.join(&file_name);
        let mut document = ChangelogDocument::open(&path)?;
        document.add_release(rendered);
        artifacts.push((file_name, path, document.content().to_string()));
    }

    let manifest = with_integrity(
        manifest,
        artifacts
            .iter()
            .map(|(name, _, contents)| (name.as_str(), contents.as_bytes())),
    );
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_json = serialize_manifest(&manifest, &manifest_path)?;

    let mut staged = Vec::with_capacity(artifacts.len() + 1);
    for (_, path, contents) in &artifacts {
        staged.push(stage(dir, path, contents)?);
    }
    staged.push(stage(dir, &manifest_path, &manifest_json)?);

    for (path, file) in staged {
        file.persist(&path).map_err(|e| OperationError::Commit {
            path: path.clone(),
            source: e.error,
        })?;
        tracing::debug!(path = %path.display(), "replaced release file");
    }

    let paths: Vec<PathBuf> = artifacts.into_iter().map(|(_, path, _)| path).collect();
    tracing::info!(
        dir = %dir.display(),
        changelogs = paths.len(),
        packages = manifest.packages.len(),
        "wrote release artifacts"
    );
    Ok(WrittenRelease {
        manifest_path,
        changelogs: paths,
        manifest,
    })
}

/// Writes `contents` to a temporary file in `dir` destined for `target`.
fn stage(dir: &Path, target: &Path, contents: &str) -> Result<(PathBuf, NamedTempFile)> {
    if target.is_dir() {
        return Err(OperationError::TargetNotFile {
            path: target.to_path_buf(),
        });
    }
    let stage_error = |source: std::io::Error| OperationError::Stage {
        path: target.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(stage_error)?;
    file.write_all(contents.as_bytes()).map_err(stage_error)?;
    Ok((target.to_path_buf(), file))
}
