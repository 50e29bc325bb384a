mod classifier;
mod error;
mod locator;
mod message;
mod refine;

pub use classifier::{ClassifyOptions, Classifier};
pub use error::ClassifyError;
pub use locator::PackageLocator;
pub use message::{ParsedMessage, parse_message};
pub use refine::refine;

pub type Result<T> = std::result::Result<T, ClassifyError>;
