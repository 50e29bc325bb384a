pub mod error;
mod forge;
mod history;
mod release;
pub mod types;

pub use error::*;
pub use forge::{Platform, RepositoryInfo};
pub use history::{CommitGraph, RevisionGraph};
pub use release::{
    PackageRelease, PolicyOverride, ReleaseManifest, SCHEMA_VERSION, WorkspaceSummary,
};
pub use types::*;
