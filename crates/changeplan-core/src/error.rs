use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown bump level '{0}' (expected none, patch, minor or major)")]
    UnknownBumpLevel(String),

    #[error("unknown release strategy '{0}' (expected independent, ripple or lockstep)")]
    UnknownStrategy(String),

    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("invalid repository URL '{url}': expected <scheme>://<host>/<owner>/<repo>")]
    InvalidRepositoryUrl { url: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
