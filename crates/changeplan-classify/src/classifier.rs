use std::collections::BTreeSet;

use changeplan_core::{
    Change, CommitType, ProviderLinks, RawCommit, Reference, ReferenceKind, RepositoryInfo,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::Result;
use crate::locator::PackageLocator;
use crate::message::parse_message;
use crate::refine::refine;

/// Post-classification filtering and folding rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClassifyOptions {
    /// Glob patterns matched against author name, email and `name <email>`.
    pub ignore_authors: Vec<String>,
    pub include_types: Vec<CommitType>,
    pub exclude_types: Vec<CommitType>,
    pub collapse_merges: bool,
    pub prefer_merge_summary: bool,
    pub collapse_reverts: bool,
}

/// Turns raw commits into [`Change`] records.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    locator: PackageLocator,
    repository: Option<RepositoryInfo>,
}

impl Classifier {
    #[must_use]
    pub fn new(locator: PackageLocator) -> Self {
        Self {
            locator,
            repository: None,
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = Some(repository);
        self
    }

    #[must_use]
    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    /// SHA-256 over every input that shapes a classification: package names
    /// and paths, ignored-file patterns and the repository used for links.
    ///
    /// Two classifiers with the same fingerprint classify any commit the same
    /// way.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut packages: Vec<(&str, &std::path::Path)> = self.locator.packages().collect();
        packages.sort_unstable();
        let mut patterns: Vec<&str> = self
            .locator
            .ignored_patterns()
            .iter()
            .map(String::as_str)
            .collect();
        patterns.sort_unstable();

        let mut hasher = Sha256::new();
        for (name, path) in packages {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update([b'\n']);
        }
        hasher.update(b"ignored\n");
        hasher.update(patterns.join("\n").as_bytes());
        hasher.update(b"\nrepository\n");
        if let Some(repo) = &self.repository {
            hasher.update(repo.base_url.as_str().as_bytes());
            hasher.update([0u8]);
            hasher.update(repo.owner.as_bytes());
            hasher.update([b'/']);
            hasher.update(repo.repo.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Classifies a single commit. Never fails; messages that are not
    /// conventional commits become `chore` changes.
    #[must_use]
    pub fn classify_commit(&self, raw: &RawCommit) -> Change {
        let parsed = parse_message(&raw.message);

        let commit_type = match parsed.commit_type {
            Some(commit_type) => commit_type,
            None if parsed.revert_of.is_some() => CommitType::Revert,
            None => {
                debug!(
                    sha = %raw.sha,
                    subject = %parsed.subject,
                    "non-conventional commit subject, classifying as chore"
                );
                CommitType::Chore
            }
        };
        let is_revert = parsed.is_revert();

        let files_changed: BTreeSet<String> = raw.files.iter().cloned().collect();
        let mut packages: BTreeSet<String> = files_changed
            .iter()
            .filter_map(|file| self.locator.locate(file))
            .map(ToString::to_string)
            .collect();

        if packages.is_empty() {
            if let Some(scope) = parsed.scope.as_deref().filter(|s| self.locator.contains(s)) {
                packages.insert(scope.to_string());
            }
        }

        let references = parsed
            .references
            .into_iter()
            .map(|(kind, id)| {
                let url = self.reference_url(kind, &id);
                Reference { kind, id, url }
            })
            .collect();

        let links = self.repository.as_ref().map(|repo| ProviderLinks {
            commit: repo.commit_url(&raw.sha),
        });

        Change {
            sha: raw.sha.clone(),
            commit_type,
            scope: parsed.scope,
            subject: parsed.subject,
            body: parsed.body,
            breaking: parsed.breaking,
            references,
            author: raw.author.clone(),
            co_authors: parsed.co_authors,
            packages,
            files_changed,
            timestamp: raw.timestamp.clone(),
            is_merge: raw.parents.len() > 1,
            is_revert,
            revert_of: parsed.revert_of,
            cherry_pick_of: parsed.cherry_pick_of,
            parents: raw.parents.clone(),
            links,
        }
    }

    /// Classifies commits (oldest first) and applies `options`.
    ///
    /// # Errors
    ///
    /// Returns `ClassifyError::InvalidAuthorPattern` if an ignore-author
    /// pattern is not a valid glob.
    pub fn classify(&self, commits: &[RawCommit], options: &ClassifyOptions) -> Result<Vec<Change>> {
        let changes = commits.iter().map(|raw| self.classify_commit(raw)).collect();
        refine(changes, options)
    }

    fn reference_url(&self, kind: ReferenceKind, id: &str) -> Option<String> {
        let repo = self.repository.as_ref()?;
        // cross-repository references such as `owner/repo#9` stay unlinked
        if !id.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(match kind {
            ReferenceKind::PullRequest => repo.pull_request_url(id),
            ReferenceKind::Closes | ReferenceKind::Fixes | ReferenceKind::Refs => {
                repo.issue_url(id)
            }
        })
    }
}
