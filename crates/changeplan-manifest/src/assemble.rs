use std::collections::BTreeMap;

use changeplan_core::{GitRange, PackageRelease, ReleaseManifest, SCHEMA_VERSION, WorkspaceSummary};
use chrono::{DateTime, Utc};

/// Builds a manifest stamped with the current time.
///
/// Releases with a `none` bump are left out and the rest are sorted by
/// package name. Inputs are cloned, never modified.
#[must_use]
pub fn assemble_manifest(range: &GitRange, releases: &[PackageRelease]) -> ReleaseManifest {
    assemble_manifest_at(range, releases, Utc::now())
}

/// Same as [`assemble_manifest`] with an explicit timestamp.
#[must_use]
pub fn assemble_manifest_at(
    range: &GitRange,
    releases: &[PackageRelease],
    timestamp: DateTime<Utc>,
) -> ReleaseManifest {
    let mut packages: Vec<PackageRelease> = releases
        .iter()
        .filter(|r| !r.bump.is_none())
        .cloned()
        .collect();
    packages.sort_by(|a, b| a.name.cmp(&b.name));

    let mut by_type = BTreeMap::new();
    let mut breaking_count = 0;
    for release in &packages {
        for change in &release.changes {
            *by_type.entry(change.commit_type).or_insert(0) += 1;
            breaking_count += change.breaking.len();
        }
    }

    ReleaseManifest {
        schema_version: SCHEMA_VERSION.to_string(),
        range: range.clone(),
        timestamp,
        packages,
        workspace: WorkspaceSummary {
            breaking_count,
            by_type,
        },
        integrity: None,
    }
}
