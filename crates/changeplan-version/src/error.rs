use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("no workspace package named '{name}' to resolve a bump for")]
    UnknownPackage { name: String },
}
