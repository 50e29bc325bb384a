use changeplan_core::RevisionGraph;
use git2::Oid;

use crate::{GitError, Repository, Result};

impl Repository {
    pub(crate) fn resolve_oid(&self, refspec: &str) -> Result<Oid> {
        let object = self
            .inner
            .revparse_single(refspec)
            .map_err(|_| GitError::RefNotFound {
                refspec: refspec.to_string(),
            })?;

        object
            .peel_to_commit()
            .map(|commit| commit.id())
            .map_err(|_| GitError::RefNotFound {
                refspec: refspec.to_string(),
            })
    }

    /// Full sha of the commit `refspec` points at.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if the revision does not name a commit.
    pub fn resolve_commit(&self, refspec: &str) -> Result<String> {
        self.resolve_oid(refspec).map(|oid| oid.to_string())
    }

    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if the repository has no commits.
    pub fn head_sha(&self) -> Result<String> {
        self.resolve_commit("HEAD")
    }

    /// Whether `ancestor` is reachable from `descendant`; a commit is its own ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if either revision cannot be resolved.
    pub fn commit_is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor = self.resolve_oid(ancestor)?;
        let descendant = self.resolve_oid(descendant)?;
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.inner.graph_descendant_of(descendant, ancestor)?)
    }
}

impl RevisionGraph for Repository {
    fn resolve(&self, rev: &str) -> Option<String> {
        self.resolve_commit(rev).ok()
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.commit_is_ancestor(ancestor, descendant)
            .unwrap_or_else(|e| {
                tracing::debug!(ancestor, descendant, error = %e, "ancestry check failed");
                false
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{commit_file, setup_test_repo};

    #[test]
    fn resolves_head_and_abbreviations() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let sha = commit_file(&repo, "a.txt", "a", "feat: a")?;

        assert_eq!(repo.head_sha()?, sha);
        assert_eq!(repo.resolve(&sha[..8]).as_deref(), Some(sha.as_str()));
        assert!(repo.resolve("no-such-ref").is_none());
        Ok(())
    }

    #[test]
    fn ancestry_follows_history() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let first = commit_file(&repo, "a.txt", "a", "feat: a")?;
        let second = commit_file(&repo, "b.txt", "b", "fix: b")?;

        assert!(repo.is_ancestor(&first, &second));
        assert!(!repo.is_ancestor(&second, &first));
        assert!(repo.is_ancestor(&second, &second));
        assert!(!repo.is_ancestor("missing", &second));
        Ok(())
    }
}
