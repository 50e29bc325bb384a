use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use changeplan_core::Platform;

use crate::Result;
use crate::builtin::{Compact, Corporate, CorporateAi, Technical};
use crate::data::TemplateData;
use crate::enhance::SummaryEnhancer;
use crate::error::TemplateError;
use crate::external::ExternalTemplate;
use crate::template::{TEMPLATE_VERSION, Template};

/// Named templates plus loading of template files by path.
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<dyn Template>>,
    base_dir: Option<PathBuf>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub const BUILTIN: [&'static str; 4] = ["corporate", "corporate-ai", "technical", "compact"];

    /// A registry holding the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let builtins: [Arc<dyn Template>; 4] = [
            Arc::new(Corporate),
            Arc::new(CorporateAi::default()),
            Arc::new(Technical),
            Arc::new(Compact),
        ];
        Self {
            templates: builtins
                .into_iter()
                .map(|t| (t.id().to_string(), t))
                .collect(),
            base_dir: None,
        }
    }

    /// Relative template paths are resolved against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Replaces the enhancer used by `corporate-ai`.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: Box<dyn SummaryEnhancer>) -> Self {
        let template: Arc<dyn Template> = Arc::new(CorporateAi::new(enhancer));
        self.templates.insert(template.id().to_string(), template);
        self
    }

    /// Adds a template under its own id, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::UnsupportedVersion` if the template does not
    /// declare [`TEMPLATE_VERSION`].
    pub fn register(&mut self, template: Box<dyn Template>) -> Result<()> {
        if template.version() != TEMPLATE_VERSION {
            return Err(TemplateError::UnsupportedVersion {
                id: template.id().to_string(),
                found: template.version().to_string(),
                expected: TEMPLATE_VERSION,
            });
        }
        let id = template.id().to_string();
        tracing::debug!(%id, "registered template");
        self.templates.insert(id, Arc::from(template));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    fn template_path(&self, id: &str) -> PathBuf {
        let path = Path::new(id);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Looks up a registered template, or loads `id` as a template file.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` for an unknown id that is not a file,
    /// and any contract error raised while loading the file.
    pub async fn resolve(&self, id: &str) -> Result<Arc<dyn Template>> {
        if let Some(template) = self.templates.get(id) {
            return Ok(Arc::clone(template));
        }

        let path = self.template_path(id);
        let template = ExternalTemplate::load(&path).await.map_err(|e| match e {
            TemplateError::NotFound { .. } => TemplateError::NotFound { id: id.to_string() },
            other => other,
        })?;
        Ok(Arc::new(template))
    }

    /// Resolves `id` and renders `data` with it.
    ///
    /// # Errors
    ///
    /// Returns any error from [`TemplateRegistry::resolve`] or from the
    /// template itself.
    pub async fn render(
        &self,
        id: &str,
        data: &TemplateData,
        platform: Option<Platform>,
    ) -> Result<String> {
        let template = self.resolve(id).await?;
        let rendered = template.render(data, platform).await?;
        tracing::debug!(
            template = id,
            package = data.package.as_deref().unwrap_or("workspace"),
            bytes = rendered.len(),
            "rendered changelog"
        );
        Ok(rendered)
    }
}
