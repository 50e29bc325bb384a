use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use changeplan_cache::{CacheError, ChangeCache};
use changeplan_changelog::{Locale, TemplateData, TemplateError};
use changeplan_core::{
    BumpLevel, BumpReason, PackageInfo, PackageRelease, Platform, ReleaseStrategy,
};
use changeplan_workspace::{Workspace, WorkspaceKind};
use semver::Version;

use crate::traits::{ChangeCacheStore, TemplateSource, WorkspaceProvider};
use crate::{ReleaseConfig, Result};

pub struct MockWorkspaceProvider {
    workspace: Workspace,
    config: ReleaseConfig,
}

impl MockWorkspaceProvider {
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            config: ReleaseConfig::default(),
        }
    }

    /// `web` depends on `api`, which depends on `core`.
    #[must_use]
    pub fn chain() -> Self {
        let root = PathBuf::from("/mock");
        let package = |name: &str, version: Version| {
            PackageInfo::new(name, version, root.join("crates").join(name))
        };
        Self::new(Workspace {
            root: root.clone(),
            kind: WorkspaceKind::Virtual,
            packages: vec![
                package("api", Version::new(1, 2, 0)).with_dependencies(["core"]),
                package("core", Version::new(1, 2, 0)),
                package("web", Version::new(0, 3, 0)).with_dependencies(["api"]),
            ],
        })
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ReleaseStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_override(mut self, package: &str, bump: BumpLevel) -> Self {
        self.config.overrides.insert(package.to_string(), bump);
        self
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}

impl WorkspaceProvider for MockWorkspaceProvider {
    fn discover(&self, _start_path: &Path) -> Result<Workspace> {
        Ok(self.workspace.clone())
    }

    fn load_config(&self, _workspace: &Workspace) -> Result<ReleaseConfig> {
        Ok(self.config.clone())
    }
}

pub struct MockCacheStore {
    cache: Mutex<Option<ChangeCache>>,
    saves: AtomicUsize,
    contended: bool,
}

impl MockCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
            saves: AtomicUsize::new(0),
            contended: false,
        }
    }

    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn with_cache(self, cache: ChangeCache) -> Self {
        *self.cache.lock().expect("cache mutex poisoned") = Some(cache);
        self
    }

    /// Every `lock` call fails as if another writer held the lock.
    #[must_use]
    pub fn contended(mut self) -> Self {
        self.contended = true;
        self
    }

    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn cache(&self) -> Option<ChangeCache> {
        self.cache.lock().expect("cache mutex poisoned").clone()
    }
}

impl Default for MockCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeCacheStore for MockCacheStore {
    type Guard = ();

    fn lock(&self, dir: &Path) -> Result<()> {
        if self.contended {
            return Err(CacheError::LockContention {
                path: dir.to_path_buf(),
                holder_pid: None,
            }
            .into());
        }
        Ok(())
    }

    fn load(&self, _dir: &Path) -> Option<ChangeCache> {
        self.cache()
    }

    fn save(&self, _guard: &(), cache: &ChangeCache) {
        *self.cache.lock().expect("cache mutex poisoned") = Some(cache.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCall {
    pub template: String,
    pub package: Option<String>,
    pub locale: Locale,
    pub platform: Option<Platform>,
}

/// Renders `"{template}:{package}:{version}"`, using `workspace` for the
/// workspace-wide changelog.
pub struct MockTemplateSource {
    calls: Mutex<Vec<RenderCall>>,
    fail_for: Option<String>,
}

impl MockTemplateSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_for: None,
        }
    }

    /// Fails when asked to render `package`.
    #[must_use]
    pub fn failing(package: &str) -> Self {
        Self {
            fail_for: Some(package.to_string()),
            ..Self::new()
        }
    }

    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl Default for MockTemplateSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateSource for MockTemplateSource {
    async fn render(
        &self,
        template: &str,
        data: &TemplateData,
        platform: Option<Platform>,
    ) -> std::result::Result<String, TemplateError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(RenderCall {
                template: template.to_string(),
                package: data.package.clone(),
                locale: data.locale,
                platform,
            });

        let package = data.package.as_deref().unwrap_or("workspace");
        if self.fail_for.as_deref() == Some(package) {
            return Err(TemplateError::Enhance {
                message: format!("cannot render {package}"),
            });
        }
        Ok(format!("{template}:{package}:{}", data.version))
    }
}

/// A release from `1.2.0` to `next` with no recorded changes.
///
/// # Panics
///
/// Panics if `next` is not valid semver.
#[must_use]
pub fn release(name: &str, next: &str) -> PackageRelease {
    let version: Version = next.parse().expect("valid version");
    let (bump, reason) = if version.major > 1 {
        (BumpLevel::Major, BumpReason::Breaking)
    } else if version.minor > 2 {
        (BumpLevel::Minor, BumpReason::Feat)
    } else {
        (BumpLevel::Patch, BumpReason::Fix)
    };
    PackageRelease {
        name: name.to_string(),
        prev: "1.2.0".to_string(),
        next: next.to_string(),
        bump,
        reason,
        ripple_from: None,
        breaking: Vec::new(),
        changes: Vec::new(),
        policy: None,
    }
}
