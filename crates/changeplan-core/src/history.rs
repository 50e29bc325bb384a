use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{RawCommit, sha_matches};

/// Commit ancestry queries needed to validate cached state against a range.
///
/// Implementations must treat unknown revisions as unresolvable rather than
/// failing; callers interpret `None`/`false` as "not consistent".
pub trait RevisionGraph {
    /// Resolves a revision (full sha, abbreviated sha, tag or `HEAD`) to a full sha.
    fn resolve(&self, rev: &str) -> Option<String>;

    /// Whether `ancestor` is reachable from `descendant`. A commit is its own ancestor.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool;
}

/// In-memory ancestry built from the parent links of raw commits.
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    parents: HashMap<String, Vec<String>>,
    refs: HashMap<String, String>,
    head: Option<String>,
}

impl CommitGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph whose `HEAD` is the last commit of the slice.
    #[must_use]
    pub fn from_commits(commits: &[RawCommit]) -> Self {
        let mut graph = Self::new();
        for commit in commits {
            graph.insert(&commit.sha, &commit.parents);
        }
        graph.head = commits.last().map(|c| c.sha.clone());
        graph
    }

    /// Adds a commit. Parents outside the known set become boundary nodes.
    pub fn insert(&mut self, sha: &str, parents: &[String]) {
        for parent in parents {
            self.parents.entry(parent.clone()).or_default();
        }
        self.parents.insert(sha.to_string(), parents.to_vec());
    }

    #[must_use]
    pub fn with_head(mut self, sha: impl Into<String>) -> Self {
        self.head = Some(sha.into());
        self
    }

    /// Registers a named ref such as a release tag.
    #[must_use]
    pub fn with_ref(mut self, name: impl Into<String>, sha: impl Into<String>) -> Self {
        self.refs.insert(name.into(), sha.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    fn lookup(&self, sha: &str) -> Option<String> {
        if self.parents.contains_key(sha) {
            return Some(sha.to_string());
        }
        let mut matches = self.parents.keys().filter(|known| sha_matches(known, sha));
        let first = matches.next()?;
        // ambiguous prefixes do not resolve
        if matches.next().is_some() {
            return None;
        }
        Some(first.clone())
    }
}

impl RevisionGraph for CommitGraph {
    fn resolve(&self, rev: &str) -> Option<String> {
        if rev == "HEAD" {
            return self.head.clone();
        }
        if let Some(target) = self.refs.get(rev) {
            return Some(target.clone());
        }
        self.lookup(rev)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let (Some(ancestor), Some(descendant)) = (self.resolve(ancestor), self.resolve(descendant))
        else {
            return false;
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([descendant]);

        while let Some(current) = queue.pop_front() {
            if current == ancestor {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(parents) = self.parents.get(&current) {
                queue.extend(parents.iter().cloned());
            }
        }

        false
    }
}
