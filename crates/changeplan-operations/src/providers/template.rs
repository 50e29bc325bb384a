use async_trait::async_trait;
use changeplan_changelog::{TemplateData, TemplateError, TemplateRegistry};
use changeplan_core::Platform;

use crate::traits::TemplateSource;

pub struct RegistryTemplateSource {
    registry: TemplateRegistry,
}

impl RegistryTemplateSource {
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self { registry }
    }
}

impl Default for RegistryTemplateSource {
    fn default() -> Self {
        Self::new(TemplateRegistry::new())
    }
}

#[async_trait]
impl TemplateSource for RegistryTemplateSource {
    async fn render(
        &self,
        template: &str,
        data: &TemplateData,
        platform: Option<Platform>,
    ) -> Result<String, TemplateError> {
        self.registry.render(template, data, platform).await
    }
}
