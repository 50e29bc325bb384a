use std::collections::BTreeMap;

use changeplan_core::{BumpLevel, BumpReason, Change, PackageInfo, PackageRelease, PolicyOverride};
use changeplan_workspace::PackageImpact;
use serde::Deserialize;

use crate::Result;
use crate::bump::{bump_version, resolve_bump};
use crate::error::VersionError;

/// Rule name recorded in `PackageRelease::policy` when a major bump is capped.
pub const STABILITY_GUARD_RULE: &str = "stability-guards.experimental.allow-major";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExperimentalGuard {
    pub allow_major: bool,
}

impl Default for ExperimentalGuard {
    fn default() -> Self {
        Self { allow_major: true }
    }
}

/// Release policies applied after bumps are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StabilityGuards {
    pub experimental: ExperimentalGuard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Decision {
    bump: BumpLevel,
    reason: Option<BumpReason>,
    ripple_from: Option<Vec<String>>,
    policy: Option<PolicyOverride>,
}

impl Decision {
    fn from_changes(changes: &[Change]) -> Self {
        let (bump, reason) = resolve_bump(changes);
        Self {
            bump,
            reason,
            ripple_from: None,
            policy: None,
        }
    }
}

/// Turns impacts and classified changes into per-package release decisions.
#[derive(Debug, Clone, Default)]
pub struct BumpResolver {
    guards: StabilityGuards,
    overrides: BTreeMap<String, BumpLevel>,
}

impl BumpResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_guards(mut self, guards: StabilityGuards) -> Self {
        self.guards = guards;
        self
    }

    /// Forces `package` to `level`, replacing whatever its changes imply.
    #[must_use]
    pub fn with_override(mut self, package: impl Into<String>, level: BumpLevel) -> Self {
        self.overrides.insert(package.into(), level);
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: BTreeMap<String, BumpLevel>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    fn apply_override(&self, name: &str, decision: &mut Decision) {
        if let Some(&level) = self.overrides.get(name) {
            decision.bump = level;
            decision.reason = Some(BumpReason::Manual);
            decision.ripple_from = None;
        }
    }

    fn apply_guard(&self, package: &PackageInfo, decision: &mut Decision) {
        if !package.experimental
            || self.guards.experimental.allow_major
            || decision.bump != BumpLevel::Major
        {
            return;
        }

        tracing::info!(
            package = %package.name,
            requested = %decision.bump,
            applied = %BumpLevel::Minor,
            "stability guard capped bump"
        );
        decision.policy = Some(PolicyOverride {
            rule: STABILITY_GUARD_RULE.to_string(),
            requested: decision.bump,
            applied: BumpLevel::Minor,
        });
        decision.bump = BumpLevel::Minor;
        decision.reason = Some(BumpReason::StabilityGuard);
    }

    fn own_decision(&self, package: &PackageInfo, changes: &[Change]) -> Decision {
        let mut decision = Decision::from_changes(changes);
        self.apply_override(&package.name, &mut decision);
        self.apply_guard(package, &mut decision);
        decision
    }

    /// Bumps implied by each package's own changes and manual overrides,
    /// without propagation. This is the input for impact analysis.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::UnknownPackage` if a package with changes or an
    /// override is missing from `packages`.
    pub fn direct_bumps(
        &self,
        changes_by_package: &BTreeMap<String, Vec<Change>>,
        packages: &[PackageInfo],
    ) -> Result<BTreeMap<String, BumpLevel>> {
        let names = changes_by_package.keys().chain(self.overrides.keys());

        let mut bumps = BTreeMap::new();
        for name in names {
            let package = find_package(packages, name)?;
            let changes = changes_by_package.get(name).map_or(&[][..], Vec::as_slice);
            bumps.insert(name.clone(), self.own_decision(package, changes).bump);
        }
        Ok(bumps)
    }

    /// Resolves one impacted package.
    ///
    /// `upstream_bumps` holds the bumps of changed packages that a ripple can
    /// originate from. A ripple only applies when it is strictly higher than
    /// the bump implied by the package's own changes. Returns `None` when the
    /// package does not need a release.
    #[must_use]
    pub fn resolve(
        &self,
        impact: &PackageImpact,
        own_changes: &[Change],
        upstream_bumps: &BTreeMap<String, BumpLevel>,
        package: &PackageInfo,
    ) -> Option<PackageRelease> {
        let mut decision = Decision::from_changes(own_changes);

        let ripple = impact
            .via_dependency
            .as_ref()
            .and_then(|via| upstream_bumps.get(via).map(|&bump| (via, bump)));
        if let Some((via, upstream)) = ripple {
            if upstream > decision.bump {
                tracing::debug!(
                    package = %package.name,
                    via = %via,
                    bump = %upstream,
                    "ripple raised bump"
                );
                decision.bump = upstream;
                decision.reason = Some(BumpReason::Ripple);
                decision.ripple_from = Some(vec![via.clone()]);
            }
        }

        self.apply_override(&package.name, &mut decision);
        self.apply_guard(package, &mut decision);

        if decision.bump.is_none() {
            tracing::debug!(package = %package.name, "no release needed");
            return None;
        }
        let reason = decision.reason?;

        Some(PackageRelease {
            name: package.name.clone(),
            prev: package.version.to_string(),
            next: bump_version(&package.version, decision.bump).to_string(),
            bump: decision.bump,
            reason,
            ripple_from: decision.ripple_from,
            breaking: own_changes
                .iter()
                .flat_map(|c| c.breaking.iter().cloned())
                .collect(),
            changes: own_changes.to_vec(),
            policy: decision.policy,
        })
    }

    /// Resolves every impacted package, dropping those that need no release.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::UnknownPackage` if an impacted package, a
    /// package with changes, or an overridden package is missing from
    /// `packages`.
    pub fn resolve_all(
        &self,
        impacts: &[PackageImpact],
        changes_by_package: &BTreeMap<String, Vec<Change>>,
        packages: &[PackageInfo],
    ) -> Result<Vec<PackageRelease>> {
        let upstream = self.direct_bumps(changes_by_package, packages)?;

        let mut releases = Vec::new();
        for impact in impacts {
            let package = find_package(packages, &impact.name)?;
            let changes = changes_by_package
                .get(&impact.name)
                .map_or(&[][..], Vec::as_slice);
            releases.extend(self.resolve(impact, changes, &upstream, package));
        }
        Ok(releases)
    }
}

fn find_package<'a>(packages: &'a [PackageInfo], name: &str) -> Result<&'a PackageInfo> {
    packages
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| VersionError::UnknownPackage {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use changeplan_core::{Author, BreakingChange, CommitType};
    use semver::Version;

    use super::*;

    fn change(sha: &str, commit_type: CommitType, package: &str) -> Change {
        Change {
            sha: sha.to_string(),
            commit_type,
            scope: None,
            subject: "subject".to_string(),
            body: None,
            breaking: Vec::new(),
            references: Vec::new(),
            author: Author::new("Ada"),
            co_authors: Vec::new(),
            packages: BTreeSet::from([package.to_string()]),
            files_changed: BTreeSet::new(),
            timestamp: String::new(),
            is_merge: false,
            is_revert: false,
            revert_of: None,
            cherry_pick_of: None,
            parents: Vec::new(),
            links: None,
        }
    }

    fn breaking_change(sha: &str, package: &str) -> Change {
        let mut change = change(sha, CommitType::Feat, package);
        change.breaking.push(BreakingChange {
            summary: "dropped old api".to_string(),
            notes: None,
        });
        change
    }

    fn package(name: &str, version: &str) -> PackageInfo {
        PackageInfo::new(name, Version::parse(version).expect("valid version"), name)
    }

    fn impact(name: &str, direct: bool, via: Option<&str>) -> PackageImpact {
        PackageImpact {
            name: name.to_string(),
            direct,
            via_dependency: via.map(ToString::to_string),
            distance: usize::from(via.is_some()),
        }
    }

    #[test]
    fn ripple_only_package_takes_upstream_bump() {
        let upstream = BTreeMap::from([("api".to_string(), BumpLevel::Minor)]);

        let release = BumpResolver::new()
            .resolve(
                &impact("app", false, Some("api")),
                &[],
                &upstream,
                &package("app", "2.0.0"),
            )
            .expect("app released");

        assert_eq!(release.bump, BumpLevel::Minor);
        assert_eq!(release.reason, BumpReason::Ripple);
        assert_eq!(release.ripple_from, Some(vec!["api".to_string()]));
        assert_eq!(release.next, "2.1.0");
        assert!(release.changes.is_empty());
    }

    #[test]
    fn own_change_dominating_ripple_keeps_own_reason() {
        let upstream = BTreeMap::from([("core".to_string(), BumpLevel::Patch)]);
        let changes = [change("a1", CommitType::Feat, "api")];

        let release = BumpResolver::new()
            .resolve(
                &impact("api", true, Some("core")),
                &changes,
                &upstream,
                &package("api", "1.0.0"),
            )
            .expect("api released");

        assert_eq!(release.bump, BumpLevel::Minor);
        assert_eq!(release.reason, BumpReason::Feat);
        assert!(release.ripple_from.is_none());
    }

    #[test]
    fn equal_ripple_does_not_replace_own_reason() {
        let upstream = BTreeMap::from([("core".to_string(), BumpLevel::Patch)]);
        let changes = [change("a1", CommitType::Fix, "api")];

        let release = BumpResolver::new()
            .resolve(
                &impact("api", true, Some("core")),
                &changes,
                &upstream,
                &package("api", "1.0.0"),
            )
            .expect("api released");

        assert_eq!(release.reason, BumpReason::Fix);
    }

    #[test]
    fn higher_ripple_replaces_own_bump() {
        let upstream = BTreeMap::from([("core".to_string(), BumpLevel::Major)]);
        let changes = [change("a1", CommitType::Fix, "api")];

        let release = BumpResolver::new()
            .resolve(
                &impact("api", true, Some("core")),
                &changes,
                &upstream,
                &package("api", "1.0.0"),
            )
            .expect("api released");

        assert_eq!(release.bump, BumpLevel::Major);
        assert_eq!(release.reason, BumpReason::Ripple);
        assert_eq!(release.changes.len(), 1);
    }

    #[test]
    fn package_without_release_is_skipped() {
        let changes = [change("a1", CommitType::Docs, "api")];

        let release = BumpResolver::new().resolve(
            &impact("api", true, None),
            &changes,
            &BTreeMap::new(),
            &package("api", "1.0.0"),
        );

        assert!(release.is_none());
    }

    #[test]
    fn stability_guard_caps_experimental_major() {
        let guards = StabilityGuards {
            experimental: ExperimentalGuard { allow_major: false },
        };
        let changes = [breaking_change("a1", "lab")];

        let release = BumpResolver::new()
            .with_guards(guards)
            .resolve(
                &impact("lab", true, None),
                &changes,
                &BTreeMap::new(),
                &package("lab", "0.3.0").experimental(),
            )
            .expect("lab released");

        assert_eq!(release.bump, BumpLevel::Minor);
        assert_eq!(release.reason, BumpReason::StabilityGuard);
        assert_eq!(release.next, "0.4.0");
        assert_eq!(
            release.policy,
            Some(PolicyOverride {
                rule: STABILITY_GUARD_RULE.to_string(),
                requested: BumpLevel::Major,
                applied: BumpLevel::Minor,
            })
        );
        assert_eq!(release.breaking.len(), 1);
    }

    #[test]
    fn stability_guard_ignores_stable_packages() {
        let guards = StabilityGuards {
            experimental: ExperimentalGuard { allow_major: false },
        };
        let changes = [breaking_change("a1", "core")];

        let release = BumpResolver::new()
            .with_guards(guards)
            .resolve(
                &impact("core", true, None),
                &changes,
                &BTreeMap::new(),
                &package("core", "1.0.0"),
            )
            .expect("core released");

        assert_eq!(release.bump, BumpLevel::Major);
        assert!(release.policy.is_none());
    }

    #[test]
    fn manual_override_replaces_computed_bump() {
        let changes = [change("a1", CommitType::Fix, "core")];

        let release = BumpResolver::new()
            .with_override("core", BumpLevel::Major)
            .resolve(
                &impact("core", true, None),
                &changes,
                &BTreeMap::new(),
                &package("core", "1.4.2"),
            )
            .expect("core released");

        assert_eq!(release.bump, BumpLevel::Major);
        assert_eq!(release.reason, BumpReason::Manual);
        assert_eq!(release.next, "2.0.0");
    }

    #[test]
    fn direct_bumps_include_overrides() {
        let packages = [package("core", "1.0.0"), package("api", "1.0.0")];
        let changes = BTreeMap::from([(
            "core".to_string(),
            vec![change("a1", CommitType::Fix, "core")],
        )]);

        let bumps = BumpResolver::new()
            .with_override("api", BumpLevel::Minor)
            .direct_bumps(&changes, &packages)
            .expect("bumps");

        assert_eq!(bumps.get("core"), Some(&BumpLevel::Patch));
        assert_eq!(bumps.get("api"), Some(&BumpLevel::Minor));
    }

    #[test]
    fn resolve_all_rejects_unknown_package() {
        let changes = BTreeMap::from([(
            "web".to_string(),
            vec![change("a1", CommitType::Fix, "web")],
        )]);

        let result = BumpResolver::new().resolve_all(&[], &changes, &[package("core", "1.0.0")]);

        assert!(matches!(result, Err(VersionError::UnknownPackage { .. })));
    }

    #[test]
    fn guards_deserialize_from_kebab_case() {
        let guards: StabilityGuards =
            toml::from_str("[experimental]\nallow-major = false\n").expect("parse guards");

        assert!(!guards.experimental.allow_major);
        assert!(StabilityGuards::default().experimental.allow_major);
    }
}
