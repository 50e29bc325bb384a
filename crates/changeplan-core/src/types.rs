use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Conventional commit type of a classified change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Perf,
    Refactor,
    Docs,
    Build,
    Ci,
    Test,
    #[default]
    Chore,
    Revert,
    Style,
}

impl CommitType {
    /// Rendering order used for changelog sections.
    pub const ORDERED: [Self; 11] = [
        Self::Feat,
        Self::Fix,
        Self::Perf,
        Self::Refactor,
        Self::Docs,
        Self::Build,
        Self::Ci,
        Self::Test,
        Self::Chore,
        Self::Revert,
        Self::Style,
    ];

    /// Parses a commit type keyword, accepting common aliases.
    ///
    /// Returns `None` for keywords that are not conventional commit types.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let commit_type = match keyword.to_ascii_lowercase().as_str() {
            "feat" | "feature" => Self::Feat,
            "fix" => Self::Fix,
            "perf" | "performance" => Self::Perf,
            "refactor" => Self::Refactor,
            "docs" | "doc" => Self::Docs,
            "build" => Self::Build,
            "ci" => Self::Ci,
            "test" | "tests" => Self::Test,
            "chore" => Self::Chore,
            "revert" => Self::Revert,
            "style" => Self::Style,
            _ => return None,
        };
        Some(commit_type)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Perf => "perf",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Build => "build",
            Self::Ci => "ci",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Revert => "revert",
            Self::Style => "style",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic-version increment level. Ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl BumpLevel {
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            _ => Err(CoreError::UnknownBumpLevel(s.to_string())),
        }
    }
}

/// Why a package received its bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BumpReason {
    Breaking,
    Feat,
    Fix,
    Perf,
    Ripple,
    Manual,
    StabilityGuard,
}

impl fmt::Display for BumpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breaking => "breaking",
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Perf => "perf",
            Self::Ripple => "ripple",
            Self::Manual => "manual",
            Self::StabilityGuard => "stability-guard",
        };
        f.write_str(s)
    }
}

/// How version obligations propagate across the workspace graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStrategy {
    #[default]
    Independent,
    Ripple,
    Lockstep,
}

impl FromStr for ReleaseStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "ripple" => Ok(Self::Ripple),
            "lockstep" => Ok(Self::Lockstep),
            _ => Err(CoreError::UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Author {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{email}>", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A commit as resolved by version-control tooling, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub author: Author,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl RawCommit {
    #[must_use]
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            author: Author::new("unknown"),
            message: message.into(),
            timestamp: String::new(),
            files: Vec::new(),
            parents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    #[must_use]
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }
}

/// Revision range `from..to`. A missing `from` means "from the root".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
}

impl GitRange {
    #[must_use]
    pub fn new(from: Option<&str>, to: impl Into<String>) -> Self {
        Self {
            from: from.map(ToString::to_string),
            to: to.into(),
        }
    }
}

impl fmt::Display for GitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{from}..{}", self.to),
            None => f.write_str(&self.to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakingChange {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    Closes,
    Fixes,
    Refs,
    PullRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLinks {
    pub commit: String,
}

/// One classified commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub sha: String,
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub breaking: Vec<BreakingChange>,
    #[serde(default)]
    pub references: Vec<Reference>,
    pub author: Author,
    #[serde(default)]
    pub co_authors: Vec<Author>,
    #[serde(default)]
    pub packages: BTreeSet<String>,
    #[serde(default)]
    pub files_changed: BTreeSet<String>,
    pub timestamp: String,
    #[serde(default)]
    pub is_merge: bool,
    #[serde(default)]
    pub is_revert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cherry_pick_of: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ProviderLinks>,
}

impl Change {
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        !self.breaking.is_empty()
    }

    /// Whether `sha` names this change, allowing abbreviated hashes.
    #[must_use]
    pub fn matches_sha(&self, sha: &str) -> bool {
        sha_matches(&self.sha, sha)
    }
}

/// Compares a full hash against a possibly abbreviated one.
#[must_use]
pub fn sha_matches(full: &str, candidate: &str) -> bool {
    const MIN_ABBREV: usize = 7;

    if full == candidate {
        return true;
    }
    let (longer, shorter) = if full.len() >= candidate.len() {
        (full, candidate)
    } else {
        (candidate, full)
    };
    shorter.len() >= MIN_ABBREV && longer.starts_with(shorter)
}

/// A workspace member as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: semver::Version,
    pub path: PathBuf,
    pub dependencies: Vec<String>,
    pub experimental: bool,
}

impl PackageInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, version: semver::Version, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            version,
            path: path.into(),
            dependencies: Vec::new(),
            experimental: false,
        }
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }
}
