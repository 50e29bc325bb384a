//! Changelog rendering.
//!
//! A [`Template`] turns [`TemplateData`] into markdown. The
//! [`TemplateRegistry`] knows the built-in templates by name and loads any
//! other name as a TOML template unit from disk.

mod builtin;
mod data;
mod document;
mod enhance;
mod error;
mod external;
mod group;
mod links;
mod locale;
mod registry;
mod template;

pub use builtin::{Compact, Corporate, CorporateAi, Technical};
pub use data::TemplateData;
pub use document::ChangelogDocument;
pub use enhance::{HighlightsEnhancer, SummaryEnhancer};
pub use error::TemplateError;
pub use external::ExternalTemplate;
pub use group::{ChangeGroup, group_changes};
pub use locale::Locale;
pub use registry::TemplateRegistry;
pub use template::{TEMPLATE_VERSION, Template};

pub type Result<T> = std::result::Result<T, TemplateError>;
