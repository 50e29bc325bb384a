use async_trait::async_trait;
use changeplan_changelog::{TemplateData, TemplateError};
use changeplan_core::Platform;

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// # Errors
    ///
    /// Returns a `TemplateError` if the template cannot be resolved or fails
    /// to render.
    async fn render(
        &self,
        template: &str,
        data: &TemplateData,
        platform: Option<Platform>,
    ) -> Result<String, TemplateError>;
}
