use async_trait::async_trait;
use changeplan_core::CommitType;

use crate::Result;
use crate::data::TemplateData;

/// Produces a short summary placed above the generated sections.
#[async_trait]
pub trait SummaryEnhancer: Send + Sync {
    /// Returns `None` when there is nothing worth summarizing.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Enhance` if the summary cannot be produced.
    async fn summarize(&self, data: &TemplateData) -> Result<Option<String>>;
}

/// Offline enhancer that lists breaking changes first, then features.
#[derive(Debug, Clone, Copy)]
pub struct HighlightsEnhancer {
    limit: usize,
}

impl HighlightsEnhancer {
    pub const DEFAULT_LIMIT: usize = 3;

    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for HighlightsEnhancer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

#[async_trait]
impl SummaryEnhancer for HighlightsEnhancer {
    async fn summarize(&self, data: &TemplateData) -> Result<Option<String>> {
        let breaking = data.breaking.iter().map(|b| b.summary.as_str());
        let features = data
            .changes
            .iter()
            .filter(|c| c.commit_type == CommitType::Feat && !c.is_breaking())
            .map(|c| c.subject.as_str());

        let lines: Vec<String> = breaking
            .chain(features)
            .take(self.limit)
            .map(|line| format!("- {line}"))
            .collect();

        Ok((!lines.is_empty()).then(|| lines.join("\n")))
    }
}
