use changeplan_core::{Change, Platform, Reference, ReferenceKind, RepositoryInfo};

const SHORT_SHA: usize = 7;

pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..SHORT_SHA).unwrap_or(sha)
}

/// Writes commit and reference links for one platform.
///
/// Without a platform everything is plain text. With a platform, links are
/// built from the repository (re-targeted at that platform) or, failing
/// that, from URLs recorded at classification time.
pub(crate) struct LinkWriter {
    repository: Option<RepositoryInfo>,
    enabled: bool,
}

impl LinkWriter {
    pub(crate) fn new(repository: Option<&RepositoryInfo>, platform: Option<Platform>) -> Self {
        let repository = match (repository, platform) {
            (Some(repo), Some(platform)) => Some(RepositoryInfo {
                platform,
                ..repo.clone()
            }),
            _ => None,
        };
        Self {
            repository,
            enabled: platform.is_some(),
        }
    }

    pub(crate) fn commit(&self, change: &Change) -> String {
        let short = short_sha(&change.sha);
        if !self.enabled {
            return short.to_string();
        }
        let url = match &self.repository {
            Some(repo) => Some(repo.commit_url(&change.sha)),
            None => change.links.as_ref().map(|links| links.commit.clone()),
        };
        match url {
            Some(url) => format!("[{short}]({url})"),
            None => short.to_string(),
        }
    }

    pub(crate) fn reference(&self, reference: &Reference) -> String {
        let label = format!("#{}", reference.id);
        if !self.enabled {
            return label;
        }
        let url = match &self.repository {
            Some(repo) if reference.kind == ReferenceKind::PullRequest => {
                Some(repo.pull_request_url(&reference.id))
            }
            Some(repo) => Some(repo.issue_url(&reference.id)),
            None => reference.url.clone(),
        };
        match url {
            Some(url) => format!("[{label}]({url})"),
            None => label,
        }
    }

    pub(crate) fn references(&self, change: &Change) -> Vec<String> {
        change.references.iter().map(|r| self.reference(r)).collect()
    }

    pub(crate) fn comparison(&self, base: &str, target: &str) -> Option<String> {
        self.repository
            .as_ref()
            .map(|repo| repo.comparison_url(base, target))
    }
}
