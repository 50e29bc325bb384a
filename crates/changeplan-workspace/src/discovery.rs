use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use changeplan_core::PackageInfo;
use globset::{GlobBuilder, GlobMatcher};
use semver::Version;

use crate::error::GraphError;
use crate::graph::WorkspaceGraph;
use crate::manifest::{CargoManifest, VersionField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    Virtual,
    RootPackage,
    SingleCrate,
}

/// A discovered Cargo workspace.
///
/// Package dependencies only list other members of the same workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
    pub kind: WorkspaceKind,
    pub packages: Vec<PackageInfo>,
}

impl Workspace {
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageInfo> {
        self.packages.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn graph(&self) -> WorkspaceGraph {
        WorkspaceGraph::from_packages(&self.packages)
    }
}

/// Finds the workspace containing `start_dir` and reads all of its members.
///
/// # Errors
///
/// Returns `GraphError` if no workspace root can be found or if manifest parsing fails.
pub fn discover_workspace(start_dir: &Path) -> Result<Workspace, GraphError> {
    let start_dir = start_dir
        .canonicalize()
        .map_err(|source| GraphError::ManifestRead {
            path: start_dir.to_path_buf(),
            source,
        })?;

    let (root, manifest) = find_workspace_root(&start_dir)?;
    let kind = determine_workspace_kind(&manifest);
    let mut members = collect_members(&root, &manifest, kind)?;

    let names: BTreeSet<String> = members.iter().map(|(p, _)| p.name.clone()).collect();
    for (package, dependencies) in &mut members {
        package.dependencies = dependencies
            .iter()
            .filter(|dep| names.contains(*dep) && **dep != package.name)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
    }

    let mut packages: Vec<PackageInfo> = members.into_iter().map(|(p, _)| p).collect();
    packages.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::debug!(
        root = %root.display(),
        ?kind,
        packages = packages.len(),
        "discovered workspace"
    );

    Ok(Workspace {
        root,
        kind,
        packages,
    })
}

fn find_workspace_root(start_dir: &Path) -> Result<(PathBuf, CargoManifest), GraphError> {
    let mut current = start_dir.to_path_buf();
    let mut fallback_single_crate: Option<(PathBuf, CargoManifest)> = None;

    loop {
        let manifest_path = current.join("Cargo.toml");

        if manifest_path.exists() {
            let manifest = read_manifest(&manifest_path)?;

            if manifest.workspace.is_some() {
                return Ok((current, manifest));
            }

            if manifest.package.is_some() && fallback_single_crate.is_none() {
                fallback_single_crate = Some((current.clone(), manifest));
            }
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => {
                return fallback_single_crate.ok_or_else(|| GraphError::NotFound {
                    start_dir: start_dir.to_path_buf(),
                });
            }
        }
    }
}

fn read_manifest(path: &Path) -> Result<CargoManifest, GraphError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| GraphError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

fn determine_workspace_kind(manifest: &CargoManifest) -> WorkspaceKind {
    match (&manifest.workspace, &manifest.package) {
        (Some(_), Some(_)) => WorkspaceKind::RootPackage,
        (None, Some(_)) => WorkspaceKind::SingleCrate,
        (Some(_) | None, None) => WorkspaceKind::Virtual,
    }
}

type Member = (PackageInfo, Vec<String>);

fn package_from_manifest(
    manifest: &CargoManifest,
    dir: &Path,
    workspace_version: Option<&String>,
) -> Result<Option<Member>, GraphError> {
    let Some(pkg) = &manifest.package else {
        return Ok(None);
    };
    let version = resolve_version(pkg.version.as_ref(), workspace_version, &dir.join("Cargo.toml"))?;

    let mut info = PackageInfo::new(pkg.name.clone(), version, dir);
    info.experimental = pkg.is_experimental();
    let dependencies = manifest.dependency_names().map(ToString::to_string).collect();

    Ok(Some((info, dependencies)))
}

fn collect_members(
    root: &Path,
    manifest: &CargoManifest,
    kind: WorkspaceKind,
) -> Result<Vec<Member>, GraphError> {
    let workspace_version = manifest
        .workspace
        .as_ref()
        .and_then(|ws| ws.package.as_ref())
        .and_then(|pkg| pkg.version.as_ref());

    let mut members = Vec::new();

    if matches!(kind, WorkspaceKind::RootPackage | WorkspaceKind::SingleCrate) {
        if let Some(member) = package_from_manifest(manifest, root, workspace_version)? {
            members.push(member);
        }
        if kind == WorkspaceKind::SingleCrate {
            return Ok(members);
        }
    }

    if let Some(workspace) = &manifest.workspace {
        let patterns = workspace.members.as_deref().unwrap_or(&[]);
        let excludes = workspace.exclude.as_deref().unwrap_or(&[]);

        for pattern in patterns {
            for member_dir in expand_member_pattern(root, pattern, excludes)? {
                let member_manifest_path = member_dir.join("Cargo.toml");
                if !member_manifest_path.exists() {
                    continue;
                }

                let member_manifest = read_manifest(&member_manifest_path)?;
                if let Some(member) =
                    package_from_manifest(&member_manifest, &member_dir, workspace_version)?
                {
                    members.push(member);
                }
            }
        }
    }

    Ok(members)
}

fn resolve_version(
    version_field: Option<&VersionField>,
    workspace_version: Option<&String>,
    manifest_path: &Path,
) -> Result<Version, GraphError> {
    let version_str = match version_field {
        Some(VersionField::Literal(v)) => v.clone(),
        Some(VersionField::Inherited(inherited)) if inherited.workspace => workspace_version
            .ok_or_else(|| GraphError::MissingField {
                path: manifest_path.to_path_buf(),
                field: "workspace.package.version",
            })?
            .clone(),
        Some(VersionField::Inherited(_)) | None => {
            return Err(GraphError::MissingField {
                path: manifest_path.to_path_buf(),
                field: "package.version",
            });
        }
    };

    version_str
        .parse()
        .map_err(|source| GraphError::InvalidVersion {
            path: manifest_path.to_path_buf(),
            version: version_str,
            source,
        })
}

fn member_matcher(pattern: &str) -> Result<GlobMatcher, GraphError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| GraphError::MemberPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn expand_member_pattern(
    root: &Path,
    pattern: &str,
    excludes: &[String],
) -> Result<Vec<PathBuf>, GraphError> {
    let glob = member_matcher(pattern)?;
    let exclude_matchers = excludes
        .iter()
        .map(|ex| member_matcher(ex))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dirs = Vec::new();
    collect_matching_dirs(root, root, &glob, &exclude_matchers, &mut dirs)?;
    dirs.sort();

    Ok(dirs)
}

fn collect_matching_dirs(
    base: &Path,
    current: &Path,
    glob: &GlobMatcher,
    excludes: &[GlobMatcher],
    results: &mut Vec<PathBuf>,
) -> Result<(), GraphError> {
    for entry in std::fs::read_dir(current)? {
        let path = entry?.path();

        if !path.is_dir() {
            continue;
        }

        let relative = path.strip_prefix(base).unwrap_or(&path);

        // never descend into build output or VCS metadata
        if relative
            .file_name()
            .is_some_and(|name| name == "target" || name == ".git")
        {
            continue;
        }

        if excludes.iter().any(|ex| ex.is_match(relative)) {
            continue;
        }

        if glob.is_match(relative) {
            results.push(path.clone());
        }

        collect_matching_dirs(base, &path, glob, excludes, results)?;
    }

    Ok(())
}
