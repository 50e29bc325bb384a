use changeplan_core::{BumpLevel, BumpReason, Change, CommitType};
use semver::{BuildMetadata, Prerelease, Version};

/// Computes the next version. Pre-release and build metadata are dropped on
/// any bump; `BumpLevel::None` returns the version unchanged.
#[must_use]
pub fn bump_version(version: &Version, level: BumpLevel) -> Version {
    let mut new_version = version.clone();

    match level {
        BumpLevel::None => return new_version,
        BumpLevel::Major => {
            new_version.major += 1;
            new_version.minor = 0;
            new_version.patch = 0;
        }
        BumpLevel::Minor => {
            new_version.minor += 1;
            new_version.patch = 0;
        }
        BumpLevel::Patch => {
            new_version.patch += 1;
        }
    }
    new_version.pre = Prerelease::EMPTY;
    new_version.build = BuildMetadata::EMPTY;

    new_version
}

/// Bump implied by a package's own changes.
///
/// Breaking changes win over `feat`, which wins over `fix`, which wins over
/// `perf`. Every other type implies no release.
#[must_use]
pub fn resolve_bump(changes: &[Change]) -> (BumpLevel, Option<BumpReason>) {
    let has = |commit_type: CommitType| changes.iter().any(|c| c.commit_type == commit_type);

    if changes.iter().any(Change::is_breaking) {
        (BumpLevel::Major, Some(BumpReason::Breaking))
    } else if has(CommitType::Feat) {
        (BumpLevel::Minor, Some(BumpReason::Feat))
    } else if has(CommitType::Fix) {
        (BumpLevel::Patch, Some(BumpReason::Fix))
    } else if has(CommitType::Perf) {
        (BumpLevel::Patch, Some(BumpReason::Perf))
    } else {
        (BumpLevel::None, None)
    }
}
