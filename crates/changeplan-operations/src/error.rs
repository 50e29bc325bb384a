use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Core(#[from] changeplan_core::CoreError),

    #[error(transparent)]
    Classify(#[from] changeplan_classify::ClassifyError),

    #[error(transparent)]
    Cache(#[from] changeplan_cache::CacheError),

    #[error(transparent)]
    Graph(#[from] changeplan_workspace::GraphError),

    #[error("bump resolution failed")]
    Version(#[from] changeplan_version::VersionError),

    #[error(transparent)]
    Manifest(#[from] changeplan_manifest::ManifestError),

    #[error(transparent)]
    Template(#[from] changeplan_changelog::TemplateError),

    #[error(transparent)]
    Git(#[from] changeplan_git::GitError),

    #[error("failed to read configuration at '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration at '{path}'")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render '{package}' with template '{template}'")]
    Render {
        template: String,
        package: String,
        #[source]
        source: changeplan_changelog::TemplateError,
    },

    #[error("unknown package '{name}' (available: {available})")]
    UnknownPackage { name: String, available: String },

    #[error("failed to create release directory '{path}'")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("release file target '{path}' is not a regular file")]
    TargetNotFile { path: PathBuf },

    #[error("failed to stage release file for '{path}'")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move release file into place at '{path}'")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, OperationError>;
