use async_trait::async_trait;
use changeplan_core::Platform;

use crate::Result;
use crate::data::TemplateData;

/// The only template contract version this engine accepts.
pub const TEMPLATE_VERSION: &str = "1.0";

/// A named, versioned changelog renderer.
///
/// Rendering may suspend, so callers always await the result.
#[async_trait]
pub trait Template: Send + Sync {
    fn id(&self) -> &str;

    fn version(&self) -> &str;

    /// Renders `data` as markdown.
    ///
    /// `platform` selects how commit and reference links are written; without
    /// it, plain hashes and `#id` references are emitted.
    ///
    /// # Errors
    ///
    /// Returns a `TemplateError` if the template cannot produce output.
    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String>;
}
