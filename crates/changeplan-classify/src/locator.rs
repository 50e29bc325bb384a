use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use changeplan_core::PackageInfo;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ClassifyError;

/// Maps repository-relative file paths to the workspace package that owns them.
#[derive(Debug, Clone)]
pub struct PackageLocator {
    // deepest path first so nested packages win over their parents
    packages: Vec<(String, PathBuf)>,
    names: BTreeSet<String>,
    ignored: GlobSet,
    ignored_patterns: Vec<String>,
}

impl Default for PackageLocator {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            names: BTreeSet::new(),
            ignored: GlobSet::empty(),
            ignored_patterns: Vec::new(),
        }
    }
}

impl PackageLocator {
    /// Builds a locator from discovered packages. Package paths are made
    /// relative to `root` when possible.
    #[must_use]
    pub fn new(root: &Path, packages: &[PackageInfo]) -> Self {
        Self::from_paths(packages.iter().map(|p| {
            // Fallback to full path if strip_prefix fails (package outside root)
            let relative = p.path.strip_prefix(root).unwrap_or(&p.path);
            (p.name.clone(), relative.to_path_buf())
        }))
    }

    #[must_use]
    pub fn from_paths<I, N, P>(packages: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        let mut packages: Vec<(String, PathBuf)> = packages
            .into_iter()
            .map(|(name, path)| (name.into(), path.into()))
            .collect();
        packages.sort_by(|a, b| {
            b.1.components()
                .count()
                .cmp(&a.1.components().count())
                .then_with(|| a.0.cmp(&b.0))
        });
        let names = packages.iter().map(|(name, _)| name.clone()).collect();

        Self {
            packages,
            names,
            ignored: GlobSet::empty(),
            ignored_patterns: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `ClassifyError::InvalidFilePattern` if a pattern is not a valid glob.
    pub fn with_ignored_files(mut self, patterns: &[String]) -> Result<Self, ClassifyError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ClassifyError::InvalidFilePattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        self.ignored = builder
            .build()
            .map_err(|source| ClassifyError::InvalidFilePattern {
                pattern: patterns.join(", "),
                source,
            })?;
        self.ignored_patterns = patterns.to_vec();
        Ok(self)
    }

    /// Packages as `(name, relative path)`, deepest path first.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.packages
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    #[must_use]
    pub fn ignored_patterns(&self) -> &[String] {
        &self.ignored_patterns
    }

    #[must_use]
    pub fn is_ignored(&self, file: &str) -> bool {
        self.ignored.is_match(file)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns the owning package of a file, ignoring configured patterns.
    #[must_use]
    pub fn locate(&self, file: &str) -> Option<&str> {
        if self.is_ignored(file) {
            return None;
        }
        let file = Path::new(file);
        self.packages
            .iter()
            .find(|(_, path)| file.starts_with(path))
            .map(|(name, _)| name.as_str())
    }
}
