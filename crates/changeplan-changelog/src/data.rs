use std::collections::BTreeSet;

use changeplan_core::{
    BreakingChange, Change, GitRange, PackageRelease, ReleaseManifest, RepositoryInfo,
};
use chrono::NaiveDate;

use crate::locale::Locale;

/// Everything a template needs to render one changelog section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData {
    pub version: String,
    pub previous_version: Option<String>,
    pub date: NaiveDate,
    /// `None` for a workspace-wide changelog.
    pub package: Option<String>,
    pub range: GitRange,
    pub changes: Vec<Change>,
    pub breaking: Vec<BreakingChange>,
    pub locale: Locale,
    pub repository: Option<RepositoryInfo>,
}

impl TemplateData {
    #[must_use]
    pub fn new(version: impl Into<String>, date: NaiveDate, range: GitRange) -> Self {
        Self {
            version: version.into(),
            previous_version: None,
            date,
            package: None,
            range,
            changes: Vec::new(),
            breaking: Vec::new(),
            locale: Locale::default(),
            repository: None,
        }
    }

    /// Data for one package's changelog.
    #[must_use]
    pub fn from_release(release: &PackageRelease, range: &GitRange, date: NaiveDate) -> Self {
        Self {
            version: release.next.clone(),
            previous_version: Some(release.prev.clone()),
            date,
            package: Some(release.name.clone()),
            range: range.clone(),
            changes: release.changes.clone(),
            breaking: release.breaking.clone(),
            locale: Locale::default(),
            repository: None,
        }
    }

    /// Data for the workspace changelog.
    ///
    /// Changes shared by several packages appear once. When every package
    /// moves to the same version that version is used, otherwise the
    /// manifest date stands in for it.
    #[must_use]
    pub fn from_manifest(manifest: &ReleaseManifest) -> Self {
        let date = manifest.timestamp.date_naive();

        let mut seen = BTreeSet::new();
        let changes: Vec<Change> = manifest
            .packages
            .iter()
            .flat_map(|release| &release.changes)
            .filter(|change| seen.insert(change.sha.clone()))
            .cloned()
            .collect();

        let mut breaking: Vec<BreakingChange> = Vec::new();
        for entry in manifest.packages.iter().flat_map(|release| &release.breaking) {
            if !breaking.contains(entry) {
                breaking.push(entry.clone());
            }
        }

        let shared = |field: fn(&PackageRelease) -> &str| {
            let mut values = manifest.packages.iter().map(field);
            let first = values.next()?;
            values.all(|v| v == first).then(|| first.to_string())
        };
        let version = shared(|r| r.next.as_str()).unwrap_or_else(|| date.to_string());
        let previous_version = shared(|r| r.prev.as_str());

        Self {
            version,
            previous_version,
            date,
            package: None,
            range: manifest.range.clone(),
            changes,
            breaking,
            locale: Locale::default(),
            repository: None,
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = Some(repository);
        self
    }

    #[must_use]
    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.breaking = changes.iter().flat_map(|c| c.breaking.clone()).collect();
        self.changes = changes;
        self
    }

    #[must_use]
    pub fn with_previous_version(mut self, previous: impl Into<String>) -> Self {
        self.previous_version = Some(previous.into());
        self
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Heading title, e.g. `api 1.3.0` or `1.3.0`.
    #[must_use]
    pub fn title(&self) -> String {
        match &self.package {
            Some(package) => format!("{package} {}", self.version),
            None => self.version.clone(),
        }
    }
}
