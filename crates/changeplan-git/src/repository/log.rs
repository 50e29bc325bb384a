use changeplan_core::{Author, GitRange, RawCommit};
use chrono::{DateTime, FixedOffset, Utc};
use git2::{Commit, Sort};

use crate::{GitError, Repository, Result};

fn format_time(time: git2::Time) -> String {
    let utc = DateTime::<Utc>::from_timestamp(time.seconds(), 0).unwrap_or_default();
    match FixedOffset::east_opt(time.offset_minutes() * 60) {
        Some(offset) => utc.with_timezone(&offset).to_rfc3339(),
        None => utc.to_rfc3339(),
    }
}

fn author_of(commit: &Commit<'_>) -> Author {
    let signature = commit.author();
    let author = Author::new(String::from_utf8_lossy(signature.name_bytes()));
    match signature.email() {
        Some(email) if !email.is_empty() => author.with_email(email),
        _ => author,
    }
}

impl Repository {
    /// Paths touched by `commit` relative to its first parent.
    fn files_of(&self, commit: &Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };

        let diff = self
            .inner
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files: Vec<String> = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().replace('\\', "/"))
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Commits reachable from `range.to` but not from `range.from`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if either end of the range cannot be
    /// resolved, or [`GitError::Walk`] if the history cannot be traversed.
    pub fn commits_in_range(&self, range: &GitRange) -> Result<Vec<RawCommit>> {
        let mut walk = self.inner.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        walk.push(self.resolve_oid(&range.to)?)?;
        if let Some(from) = &range.from {
            walk.hide(self.resolve_oid(from)?)?;
        }

        let mut commits = Vec::new();
        for oid in walk {
            let oid = oid.map_err(|source| GitError::Walk {
                range: range.to_string(),
                source,
            })?;
            let commit = self.inner.find_commit(oid)?;
            let raw = RawCommit::new(
                commit.id().to_string(),
                String::from_utf8_lossy(commit.message_bytes()),
            )
            .with_author(author_of(&commit))
            .with_timestamp(format_time(commit.time()))
            .with_files(self.files_of(&commit)?)
            .with_parents(commit.parent_ids().map(|id| id.to_string()));
            commits.push(raw);
        }

        tracing::debug!(%range, commits = commits.len(), "read commit range");
        Ok(commits)
    }
}
