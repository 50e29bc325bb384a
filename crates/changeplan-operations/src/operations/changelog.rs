use changeplan_changelog::{Locale, TemplateData};
use changeplan_core::{Platform, ReleaseManifest, RepositoryInfo};
use indexmap::IndexMap;

use crate::error::OperationError;
use crate::traits::TemplateSource;
use crate::{ReleaseConfig, Result};

/// Markdown produced for one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedChangelogs {
    /// Per-package changelogs in manifest order.
    pub packages: IndexMap<String, String>,
    pub workspace: String,
}

pub struct ChangelogOperation<T> {
    source: T,
    template: String,
    locale: Locale,
    repository: Option<RepositoryInfo>,
}

impl<T> ChangelogOperation<T>
where
    T: TemplateSource,
{
    pub fn new(source: T, template: impl Into<String>) -> Self {
        Self {
            source,
            template: template.into(),
            locale: Locale::default(),
            repository: None,
        }
    }

    /// Uses the configured template, locale and repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured repository URL is invalid.
    pub fn from_config(source: T, config: &ReleaseConfig) -> Result<Self> {
        let mut operation = Self::new(source, config.template.clone()).with_locale(config.locale());
        operation.repository = config.repository_info()?;
        Ok(operation)
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = Some(repository);
        self
    }

    fn decorate(&self, data: TemplateData) -> TemplateData {
        let data = data.with_locale(self.locale);
        match &self.repository {
            Some(repository) => data.with_repository(repository.clone()),
            None => data,
        }
    }

    async fn render_one(
        &self,
        package: &str,
        data: &TemplateData,
        platform: Option<Platform>,
    ) -> Result<String> {
        self.source
            .render(&self.template, data, platform)
            .await
            .map_err(|source| OperationError::Render {
                template: self.template.clone(),
                package: package.to_string(),
                source,
            })
    }

    /// Renders every released package and the workspace summary.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Render` naming the template and package of
    /// the first failure.
    pub async fn render(
        &self,
        manifest: &ReleaseManifest,
        platform: Option<Platform>,
    ) -> Result<RenderedChangelogs> {
        let date = manifest.timestamp.date_naive();

        let mut packages = IndexMap::new();
        for release in &manifest.packages {
            let data = self.decorate(TemplateData::from_release(release, &manifest.range, date));
            let rendered = self.render_one(&release.name, &data, platform).await?;
            packages.insert(release.name.clone(), rendered);
        }

        let data = self.decorate(TemplateData::from_manifest(manifest));
        let workspace = self.render_one("workspace", &data, platform).await?;

        tracing::info!(
            template = %self.template,
            packages = packages.len(),
            "rendered changelogs"
        );
        Ok(RenderedChangelogs {
            packages,
            workspace,
        })
    }
}

#[cfg(test)]
mod tests {
    use changeplan_core::GitRange;
    use changeplan_manifest::assemble_manifest;

    use super::*;
    use crate::mocks::{MockTemplateSource, release};

    fn manifest() -> ReleaseManifest {
        assemble_manifest(
            &GitRange::new(Some("v1.2.0"), "HEAD"),
            &[release("core", "1.2.1"), release("api", "1.3.0")],
        )
    }

    #[tokio::test]
    async fn renders_each_package_then_workspace() -> anyhow::Result<()> {
        let operation = ChangelogOperation::new(MockTemplateSource::new(), "compact")
            .with_locale(Locale::Fr);

        let rendered = operation.render(&manifest(), Some(Platform::GitHub)).await?;

        let names: Vec<&str> = rendered.packages.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["api", "core"]);
        assert_eq!(rendered.packages["api"], "compact:api:1.3.0");
        assert!(rendered.workspace.starts_with("compact:workspace:"));

        let calls = operation.source.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|call| call.locale == Locale::Fr));
        assert!(calls.iter().all(|call| call.platform == Some(Platform::GitHub)));
        Ok(())
    }

    #[tokio::test]
    async fn render_failure_names_template_and_package() {
        let operation = ChangelogOperation::new(MockTemplateSource::failing("core"), "corporate");

        let result = operation.render(&manifest(), None).await;

        assert!(matches!(
            result,
            Err(OperationError::Render { template, package, .. })
                if template == "corporate" && package == "core"
        ));
    }

    #[test]
    fn from_config_reads_locale_and_repository() -> anyhow::Result<()> {
        let config = ReleaseConfig {
            template: "technical".to_string(),
            locale: "es".to_string(),
            repository: Some("https://github.com/acme/widgets".to_string()),
            ..ReleaseConfig::default()
        };

        let operation = ChangelogOperation::from_config(MockTemplateSource::new(), &config)?;

        assert_eq!(operation.template, "technical");
        assert_eq!(operation.locale, Locale::Es);
        assert!(operation.repository.is_some());
        Ok(())
    }
}
