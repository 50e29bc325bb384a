use semver::Version;

use crate::{ReleaseTag, Repository, Result};

impl Repository {
    /// The highest-versioned `<package>-v<semver>` tag, if any.
    ///
    /// Tags whose suffix is not a valid version are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag list cannot be read.
    pub fn latest_tag_for(&self, package: &str) -> Result<Option<ReleaseTag>> {
        let prefix = format!("{package}-v");
        let names = self.inner.tag_names(Some(&format!("{prefix}*")))?;

        let mut latest: Option<(Version, String)> = None;
        for name in names.iter().flatten() {
            let Some(Ok(version)) = name.strip_prefix(&prefix).map(Version::parse) else {
                tracing::debug!(tag = name, "skipping tag without a version suffix");
                continue;
            };
            if latest.as_ref().is_none_or(|(current, _)| version > *current) {
                latest = Some((version, name.to_string()));
            }
        }

        let Some((version, name)) = latest else {
            return Ok(None);
        };
        let sha = self.resolve_commit(&name)?;

        Ok(Some(ReleaseTag {
            package: package.to_string(),
            name,
            version,
            sha,
        }))
    }
}
