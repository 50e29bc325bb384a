//! `[workspace.metadata.changeplan]` configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use changeplan_changelog::Locale;
use changeplan_classify::ClassifyOptions;
use changeplan_core::{BumpLevel, ReleaseStrategy, RepositoryInfo};
use changeplan_version::StabilityGuards;
use serde::Deserialize;

use crate::Result;
use crate::error::OperationError;

const DEFAULT_CACHE_DIR: &str = ".changeplan/cache";
const DEFAULT_OUTPUT_DIR: &str = ".changeplan/release";
const DEFAULT_TEMPLATE: &str = "corporate";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReleaseConfig {
    pub strategy: ReleaseStrategy,
    /// Relative paths are resolved against the workspace root.
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Built-in template name or path to a template file.
    pub template: String,
    pub locale: String,
    pub repository: Option<String>,
    /// Globs for files that never attribute a commit to a package.
    pub ignored_files: Vec<String>,
    pub classify: ClassifyOptions,
    pub stability_guards: StabilityGuards,
    /// Forced bump levels by package name.
    pub overrides: BTreeMap<String, BumpLevel>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            strategy: ReleaseStrategy::default(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            template: DEFAULT_TEMPLATE.to_string(),
            locale: Locale::default().to_string(),
            repository: None,
            ignored_files: Vec::new(),
            classify: ClassifyOptions::default(),
            stability_guards: StabilityGuards::default(),
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MetadataTable {
    changeplan: Option<ReleaseConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataOwner {
    metadata: Option<MetadataTable>,
}

#[derive(Debug, Default, Deserialize)]
struct RootManifest {
    workspace: Option<MetadataOwner>,
    package: Option<MetadataOwner>,
}

impl ReleaseConfig {
    /// Parses a standalone configuration document.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::ConfigParse` if the document is not valid.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| OperationError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `[workspace.metadata.changeplan]`, or `[package.metadata.changeplan]`
    /// for a single crate, from the root `Cargo.toml`. A missing section
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::ConfigRead` or `OperationError::ConfigParse`
    /// if the manifest cannot be read or the section is invalid.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("Cargo.toml");
        let contents = std::fs::read_to_string(&path).map_err(|source| {
            OperationError::ConfigRead {
                path: path.clone(),
                source,
            }
        })?;

        let manifest: RootManifest =
            toml::from_str(&contents).map_err(|source| OperationError::ConfigParse {
                path: path.clone(),
                source,
            })?;

        let config = manifest
            .workspace
            .and_then(|owner| owner.metadata)
            .and_then(|metadata| metadata.changeplan)
            .or_else(|| {
                manifest
                    .package
                    .and_then(|owner| owner.metadata)
                    .and_then(|metadata| metadata.changeplan)
            });

        match config {
            Some(config) => Ok(config),
            None => {
                tracing::debug!(path = %path.display(), "no changeplan section, using defaults");
                Ok(Self::default())
            }
        }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        Locale::from_tag(&self.locale)
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidRepositoryUrl` if `repository` is set but
    /// cannot be parsed.
    pub fn repository_info(&self) -> Result<Option<RepositoryInfo>> {
        self.repository
            .as_deref()
            .map(RepositoryInfo::from_url)
            .transpose()
            .map_err(OperationError::from)
    }

    #[must_use]
    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_dir)
    }

    #[must_use]
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output_dir)
    }
}
