use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{id}' declares version '{found}', expected '{expected}'")]
    UnsupportedVersion {
        id: String,
        found: String,
        expected: &'static str,
    },

    #[error("template '{id}' does not provide a [render] section")]
    MissingRender { id: String },

    #[error("template '{id}' is neither built in nor a readable file")]
    NotFound { id: String },

    #[error("failed to read template at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template at '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("summary enhancement failed: {message}")]
    Enhance { message: String },
}
