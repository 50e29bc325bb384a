use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Hosting platform used to build commit, issue and comparison links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    GitHub,
    GitLab,
    Bitbucket,
    Gitea,
    SourceHut,
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket" => Ok(Self::Bitbucket),
            "gitea" | "codeberg" => Ok(Self::Gitea),
            "sourcehut" | "srht" => Ok(Self::SourceHut),
            _ => Err(CoreError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::Gitea => "gitea",
            Self::SourceHut => "sourcehut",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub platform: Platform,
    pub owner: String,
    pub repo: String,
    pub base_url: Url,
}

impl RepositoryInfo {
    /// Accepts web URLs as well as `ssh://` and `git@host:owner/repo` remotes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRepositoryUrl` if the URL cannot be parsed or
    /// does not contain an `owner/repo` path.
    pub fn from_url(url_str: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidRepositoryUrl {
            url: url_str.to_string(),
        };

        let url = Url::parse(&https_remote(url_str)).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        let platform = detect_platform(host);

        let path = url.path().trim_start_matches('/').trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(invalid());
        }

        let base_url =
            Url::parse(&format!("{}://{}", url.scheme(), host)).map_err(|_| invalid())?;

        Ok(Self {
            platform,
            owner: segments[0].trim_start_matches('~').to_string(),
            repo: segments[1].to_string(),
            base_url,
        })
    }

    fn project_url(&self) -> String {
        match self.platform {
            Platform::SourceHut => format!("{}~{}/{}", self.base_url, self.owner, self.repo),
            _ => format!("{}{}/{}", self.base_url, self.owner, self.repo),
        }
    }

    #[must_use]
    pub fn commit_url(&self, sha: &str) -> String {
        let project = self.project_url();
        match self.platform {
            Platform::GitHub | Platform::Gitea => format!("{project}/commit/{sha}"),
            Platform::GitLab => format!("{project}/-/commit/{sha}"),
            Platform::Bitbucket => format!("{project}/commits/{sha}"),
            Platform::SourceHut => format!("{project}/commit/{sha}"),
        }
    }

    #[must_use]
    pub fn issue_url(&self, id: &str) -> String {
        let project = self.project_url();
        let id = id.trim_start_matches('#');
        match self.platform {
            Platform::GitHub | Platform::Gitea => format!("{project}/issues/{id}"),
            Platform::GitLab => format!("{project}/-/issues/{id}"),
            Platform::Bitbucket => format!("{project}/issues/{id}"),
            Platform::SourceHut => format!("https://todo.sr.ht/~{}/{}/{id}", self.owner, self.repo),
        }
    }

    #[must_use]
    pub fn pull_request_url(&self, id: &str) -> String {
        let project = self.project_url();
        let id = id.trim_start_matches('#');
        match self.platform {
            Platform::GitHub => format!("{project}/pull/{id}"),
            Platform::Gitea => format!("{project}/pulls/{id}"),
            Platform::GitLab => format!("{project}/-/merge_requests/{id}"),
            Platform::Bitbucket => format!("{project}/pull-requests/{id}"),
            Platform::SourceHut => format!("{project}/patches/{id}"),
        }
    }

    #[must_use]
    pub fn comparison_url(&self, base: &str, target: &str) -> String {
        let project = self.project_url();
        match self.platform {
            Platform::GitHub | Platform::Gitea => format!("{project}/compare/{base}...{target}"),
            Platform::GitLab => format!("{project}/-/compare/{base}...{target}"),
            Platform::Bitbucket => format!("{project}/branches/compare/{target}..{base}"),
            Platform::SourceHut => format!("{project}/log/{base}..{target}"),
        }
    }
}

fn detect_platform(host: &str) -> Platform {
    let host_lower = host.to_lowercase();

    if host_lower == "github.com" || host_lower.ends_with(".github.com") {
        Platform::GitHub
    } else if host_lower == "gitlab.com"
        || host_lower.starts_with("gitlab.")
        || host_lower.contains(".gitlab.")
    {
        Platform::GitLab
    } else if host_lower == "bitbucket.org" || host_lower.ends_with(".bitbucket.org") {
        Platform::Bitbucket
    } else if host_lower == "codeberg.org" || host_lower.starts_with("gitea.") {
        Platform::Gitea
    } else if host_lower == "git.sr.ht" || host_lower.ends_with(".sr.ht") {
        Platform::SourceHut
    } else {
        Platform::GitHub
    }
}

/// Rewrites ssh remotes to the https URL of the same project.
fn https_remote(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("ssh://") {
        let host_and_path = rest.split_once('@').map_or(rest, |(_, after)| after);
        return format!("https://{host_and_path}");
    }
    if url.contains("://") {
        return url.to_string();
    }
    match url.split_once(':') {
        Some((user_host, path)) => {
            let host = user_host.rsplit_once('@').map_or(user_host, |(_, host)| host);
            format!("https://{host}/{path}")
        }
        None => url.to_string(),
    }
}
