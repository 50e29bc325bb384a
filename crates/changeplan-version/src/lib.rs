mod bump;
mod error;
mod resolver;

pub use bump::{bump_version, resolve_bump};
pub use error::VersionError;
pub use resolver::{BumpResolver, ExperimentalGuard, STABILITY_GUARD_RULE, StabilityGuards};

pub type Result<T> = std::result::Result<T, VersionError>;
