use std::path::Path;

use changeplan_workspace::{Workspace, discover_workspace};

use crate::traits::WorkspaceProvider;
use crate::{ReleaseConfig, Result};

pub struct FileSystemWorkspaceProvider;

impl FileSystemWorkspaceProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemWorkspaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceProvider for FileSystemWorkspaceProvider {
    fn discover(&self, start_path: &Path) -> Result<Workspace> {
        Ok(discover_workspace(start_path)?)
    }

    fn load_config(&self, workspace: &Workspace) -> Result<ReleaseConfig> {
        ReleaseConfig::load(&workspace.root)
    }
}
