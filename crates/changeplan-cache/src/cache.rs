use std::collections::BTreeMap;
use std::fmt;

use changeplan_core::{Change, GitRange, RevisionGraph};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMeta {
    pub graph_hash: String,
    /// Fingerprint of the classifier that produced the cached entries.
    #[serde(default)]
    pub classifier: String,
    /// Commit that was `HEAD` when the cache was last written.
    #[serde(rename = "HEAD")]
    pub head: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastTag {
    pub tag: String,
    pub sha: String,
}

/// Per-commit classification results keyed by sha.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCache {
    pub meta: CacheMeta,
    #[serde(default)]
    pub commits: BTreeMap<String, Change>,
    #[serde(default)]
    pub last_tags: BTreeMap<String, LastTag>,
}

/// Why a cache cannot be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Missing,
    GraphChanged,
    ClassifierChanged,
    HeadDiverged,
    RangeUnreachable,
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "no cache present",
            Self::GraphChanged => "workspace graph changed",
            Self::ClassifierChanged => "package paths, ignored files or repository changed",
            Self::HeadDiverged => "HEAD is not a descendant of the cached HEAD",
            Self::RangeUnreachable => "range is not reachable from HEAD",
        };
        f.write_str(s)
    }
}

impl ChangeCache {
    #[must_use]
    pub fn new(graph_hash: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            meta: CacheMeta {
                graph_hash: graph_hash.into(),
                head: head.into(),
                ..CacheMeta::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, fingerprint: impl Into<String>) -> Self {
        self.meta.classifier = fingerprint.into();
        self
    }

    /// Rejects entries produced by a classifier with a different fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `Invalidation::ClassifierChanged` on a mismatch.
    pub fn check_classifier(&self, fingerprint: &str) -> Result<(), Invalidation> {
        if self.meta.classifier == fingerprint {
            Ok(())
        } else {
            Err(Invalidation::ClassifierChanged)
        }
    }

    #[must_use]
    pub fn get(&self, sha: &str) -> Option<&Change> {
        self.commits.get(sha)
    }

    #[must_use]
    pub fn contains(&self, sha: &str) -> bool {
        self.commits.contains_key(sha)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Inserts newly classified changes, keeping existing entries for known
    /// shas. Returns how many entries were added.
    pub fn merge_classified<I>(&mut self, changes: I) -> usize
    where
        I: IntoIterator<Item = Change>,
    {
        let before = self.commits.len();
        for change in changes {
            self.commits.entry(change.sha.clone()).or_insert(change);
        }
        self.commits.len() - before
    }

    pub fn set_head(&mut self, head: impl Into<String>) {
        self.meta.head = head.into();
    }

    pub fn update_last_tag(
        &mut self,
        package: impl Into<String>,
        tag: impl Into<String>,
        sha: impl Into<String>,
    ) {
        self.last_tags.insert(
            package.into(),
            LastTag {
                tag: tag.into(),
                sha: sha.into(),
            },
        );
    }

    #[must_use]
    pub fn last_tag(&self, package: &str) -> Option<&LastTag> {
        self.last_tags.get(package)
    }

    /// Checks whether this cache can serve `range`.
    ///
    /// Checks are skipped for whichever of `graph_hash` and `head` is `None`.
    /// With a `head`, the cached `HEAD` must be an ancestor of it, `range.to`
    /// must be reachable from it and `range.from` must be an ancestor of
    /// `range.to`.
    ///
    /// # Errors
    ///
    /// Returns the first reason the cache is stale.
    pub fn check(
        &self,
        range: &GitRange,
        graph_hash: Option<&str>,
        head: Option<&str>,
        revisions: &dyn RevisionGraph,
    ) -> Result<(), Invalidation> {
        if graph_hash.is_some_and(|hash| hash != self.meta.graph_hash) {
            return Err(Invalidation::GraphChanged);
        }

        let Some(head) = head else {
            return Ok(());
        };

        if self.meta.head.is_empty() || !revisions.is_ancestor(&self.meta.head, head) {
            return Err(Invalidation::HeadDiverged);
        }

        let Some(to) = revisions.resolve(&range.to) else {
            return Err(Invalidation::RangeUnreachable);
        };
        if !revisions.is_ancestor(&to, head) {
            return Err(Invalidation::RangeUnreachable);
        }
        if let Some(from) = &range.from {
            if !revisions.is_ancestor(from, &to) {
                return Err(Invalidation::RangeUnreachable);
            }
        }

        Ok(())
    }
}
