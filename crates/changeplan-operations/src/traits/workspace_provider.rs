use std::path::Path;

use changeplan_workspace::Workspace;

use crate::{ReleaseConfig, Result};

pub trait WorkspaceProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no workspace can be found from the given path.
    fn discover(&self, start_path: &Path) -> Result<Workspace>;

    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_config(&self, workspace: &Workspace) -> Result<ReleaseConfig>;
}
