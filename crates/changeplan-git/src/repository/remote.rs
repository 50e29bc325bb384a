use crate::{Repository, Result};

const DEFAULT_REMOTE: &str = "origin";

impl Repository {
    /// URL of `origin`, or of the only remote when `origin` is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote list cannot be read.
    pub fn remote_url(&self) -> Result<Option<String>> {
        let names = self.inner.remotes()?;
        let name = if names.iter().flatten().any(|n| n == DEFAULT_REMOTE) {
            DEFAULT_REMOTE
        } else {
            match names.iter().flatten().collect::<Vec<_>>().as_slice() {
                [only] => *only,
                _ => return Ok(None),
            }
        };

        let remote = self.inner.find_remote(name)?;
        Ok(remote.url().map(String::from))
    }
}
