use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid author pattern '{pattern}'")]
    InvalidAuthorPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid ignored-file pattern '{pattern}'")]
    InvalidFilePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
