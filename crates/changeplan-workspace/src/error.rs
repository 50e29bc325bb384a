use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("package '{name}' is not part of the workspace graph")]
    UnknownPackage { name: String },

    #[error("failed to scan workspace directories")]
    Io(#[from] std::io::Error),

    #[error("no Cargo workspace or package found above '{start_dir}'")]
    NotFound { start_dir: PathBuf },

    #[error("failed to read manifest at '{path}'")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest at '{path}'")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("'{path}' does not set '{field}'")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("invalid version '{version}' in package at '{path}'")]
    InvalidVersion {
        path: PathBuf,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid workspace member pattern '{pattern}'")]
    MemberPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
