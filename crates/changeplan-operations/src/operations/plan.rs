use std::collections::BTreeMap;
use std::path::PathBuf;

use changeplan_cache::{ChangeCache, LastTag};
use changeplan_classify::{Classifier, PackageLocator, refine};
use changeplan_core::{
    Change, CommitGraph, GitRange, RawCommit, ReleaseManifest, RepositoryInfo, RevisionGraph,
};
use changeplan_git::Repository;
use changeplan_manifest::assemble_manifest;
use changeplan_version::BumpResolver;
use changeplan_workspace::{Workspace, compute_impact};

use crate::error::OperationError;
use crate::traits::{ChangeCacheStore, WorkspaceProvider};
use crate::{ReleaseConfig, Result};

/// Input for one planning run.
pub struct PlanRequest<'a> {
    pub start_path: PathBuf,
    pub range: GitRange,
    /// Commits of `range`, oldest first.
    pub commits: Vec<RawCommit>,
    /// Ancestry used to validate the cache. Defaults to the parent links of
    /// `commits`.
    pub revisions: Option<&'a dyn RevisionGraph>,
    /// Remote URL used for links when the configuration names no repository.
    pub remote_url: Option<String>,
    /// Newest release tag per package, recorded in the cache.
    pub last_tags: BTreeMap<String, LastTag>,
}

impl<'a> PlanRequest<'a> {
    #[must_use]
    pub fn new(start_path: impl Into<PathBuf>, range: GitRange, commits: Vec<RawCommit>) -> Self {
        Self {
            start_path: start_path.into(),
            range,
            commits,
            revisions: None,
            remote_url: None,
            last_tags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_revisions(mut self, revisions: &'a dyn RevisionGraph) -> Self {
        self.revisions = Some(revisions);
        self
    }

    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_last_tag(mut self, package: &str, tag: impl Into<String>, sha: impl Into<String>) -> Self {
        self.last_tags.insert(
            package.to_string(),
            LastTag {
                tag: tag.into(),
                sha: sha.into(),
            },
        );
        self
    }

    /// Reads `range` from `repository`, which also answers ancestry queries
    /// and supplies the `origin` remote URL.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the range cannot be resolved or walked.
    pub fn from_repository(repository: &'a Repository, range: GitRange) -> Result<Self> {
        let commits = repository.commits_in_range(&range)?;
        let mut request = Self::new(repository.root(), range, commits).with_revisions(repository);
        request.remote_url = repository.remote_url()?;
        Ok(request)
    }

    /// Records the newest `<package>-v<version>` tag of each named package.
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the tags cannot be read.
    pub fn with_release_tags<'p, I>(mut self, repository: &Repository, packages: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'p str>,
    {
        for package in packages {
            if let Some(tag) = repository.latest_tag_for(package)? {
                self = self.with_last_tag(package, tag.name, tag.sha);
            }
        }
        Ok(self)
    }
}

pub struct PlanOperation<W, C> {
    workspace_provider: W,
    cache_store: C,
}

impl<W, C> PlanOperation<W, C>
where
    W: WorkspaceProvider,
    C: ChangeCacheStore,
{
    pub fn new(workspace_provider: W, cache_store: C) -> Self {
        Self {
            workspace_provider,
            cache_store,
        }
    }

    /// Computes the release manifest for `request.range`.
    ///
    /// # Errors
    ///
    /// Returns an error if workspace discovery, configuration, the cache lock,
    /// classification settings, impact analysis or bump resolution fail. No
    /// manifest is produced in that case.
    pub fn plan(&self, request: &PlanRequest<'_>) -> Result<ReleaseManifest> {
        let workspace = self.workspace_provider.discover(&request.start_path)?;
        let config = self.workspace_provider.load_config(&workspace)?;
        check_overrides(&config, &workspace)?;

        let graph = workspace.graph();
        let graph_hash = graph.graph_hash();

        let locator = PackageLocator::new(&workspace.root, &workspace.packages)
            .with_ignored_files(&config.ignored_files)?;
        let mut classifier = Classifier::new(locator);
        if let Some(repository) = repository_for(&config, request)? {
            classifier = classifier.with_repository(repository);
        }

        let fallback;
        let revisions: &dyn RevisionGraph = match request.revisions {
            Some(revisions) => revisions,
            None => {
                fallback = CommitGraph::from_commits(&request.commits);
                &fallback
            }
        };

        let classified = self.classify_cached(
            &config.cache_dir(&workspace.root),
            request,
            &classifier,
            &graph_hash,
            revisions,
        )?;

        let changes = refine(classified, &config.classify)?;
        let by_package = group_by_package(changes, &workspace);

        let resolver = BumpResolver::new()
            .with_guards(config.stability_guards)
            .with_overrides(config.overrides.clone());
        let direct = resolver.direct_bumps(&by_package, &workspace.packages)?;
        let impacts = compute_impact(&direct, &graph, config.strategy)?;
        let releases = resolver.resolve_all(&impacts, &by_package, &workspace.packages)?;

        let manifest = assemble_manifest(&request.range, &releases);
        tracing::info!(
            range = %request.range,
            strategy = ?config.strategy,
            packages = manifest.packages.len(),
            "planned release"
        );
        Ok(manifest)
    }

    /// Classifies the request's commits, reusing cached entries when the
    /// cache is still valid. The cache lock is held until this returns.
    fn classify_cached(
        &self,
        cache_dir: &std::path::Path,
        request: &PlanRequest<'_>,
        classifier: &Classifier,
        graph_hash: &str,
        revisions: &dyn RevisionGraph,
    ) -> Result<Vec<Change>> {
        let head = revisions.resolve(&request.range.to);
        let guard = self.cache_store.lock(cache_dir)?;

        let fingerprint = classifier.fingerprint();
        let fresh = || {
            ChangeCache::new(graph_hash, head.clone().unwrap_or_default())
                .with_classifier(fingerprint.as_str())
        };
        let mut cache = match self.cache_store.load(cache_dir) {
            Some(cached) => {
                let checked = cached.check_classifier(&fingerprint).and_then(|()| {
                    cached.check(&request.range, Some(graph_hash), head.as_deref(), revisions)
                });
                match checked {
                    Ok(()) => {
                        tracing::debug!(entries = cached.len(), "cache hit");
                        cached
                    }
                    Err(reason) => {
                        tracing::info!(%reason, "cache invalidated");
                        fresh()
                    }
                }
            }
            None => {
                tracing::debug!("cache miss");
                fresh()
            }
        };

        let pending: Vec<Change> = request
            .commits
            .iter()
            .filter(|commit| !cache.contains(&commit.sha))
            .map(|commit| classifier.classify_commit(commit))
            .collect();
        let added = cache.merge_classified(pending);
        if let Some(head) = &head {
            cache.set_head(head.clone());
        }
        for (package, tag) in &request.last_tags {
            cache.update_last_tag(package.as_str(), tag.tag.as_str(), tag.sha.as_str());
        }
        tracing::debug!(
            reused = request.commits.len() - added,
            classified = added,
            "classified commits"
        );

        self.cache_store.save(&guard, &cache);
        drop(guard);

        Ok(request
            .commits
            .iter()
            .filter_map(|commit| cache.get(&commit.sha).cloned())
            .collect())
    }
}

/// The configured repository, else the request's remote when it parses.
fn repository_for(config: &ReleaseConfig, request: &PlanRequest<'_>) -> Result<Option<RepositoryInfo>> {
    if let Some(repository) = config.repository_info()? {
        return Ok(Some(repository));
    }
    let Some(url) = &request.remote_url else {
        return Ok(None);
    };
    match RepositoryInfo::from_url(url) {
        Ok(repository) => Ok(Some(repository)),
        Err(error) => {
            tracing::debug!(url, %error, "remote URL not recognised, links disabled");
            Ok(None)
        }
    }
}

fn check_overrides(config: &ReleaseConfig, workspace: &Workspace) -> Result<()> {
    for name in config.overrides.keys() {
        if workspace.package(name).is_none() {
            let available: Vec<&str> = workspace.packages.iter().map(|p| p.name.as_str()).collect();
            return Err(OperationError::UnknownPackage {
                name: name.clone(),
                available: available.join(", "),
            });
        }
    }
    Ok(())
}

fn group_by_package(changes: Vec<Change>, workspace: &Workspace) -> BTreeMap<String, Vec<Change>> {
    let mut by_package: BTreeMap<String, Vec<Change>> = BTreeMap::new();
    for change in changes {
        for package in &change.packages {
            if workspace.package(package).is_some() {
                by_package
                    .entry(package.clone())
                    .or_default()
                    .push(change.clone());
            } else {
                tracing::debug!(package, sha = %change.sha, "change names a package outside the workspace");
            }
        }
    }
    by_package
}
