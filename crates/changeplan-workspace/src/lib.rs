mod discovery;
mod error;
mod graph;
mod impact;
mod manifest;

pub use discovery::{Workspace, WorkspaceKind, discover_workspace};
pub use error::GraphError;
pub use graph::WorkspaceGraph;
pub use impact::{PackageImpact, compute_impact};

pub type Result<T> = std::result::Result<T, GraphError>;
