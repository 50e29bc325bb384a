//! Templates shipped with the engine.

use std::fmt::Write;

use async_trait::async_trait;
use changeplan_core::{Change, Platform};

use crate::Result;
use crate::data::TemplateData;
use crate::enhance::{HighlightsEnhancer, SummaryEnhancer};
use crate::group::group_changes;
use crate::links::LinkWriter;
use crate::template::{TEMPLATE_VERSION, Template};

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_references(entry: String, references: &[String]) -> String {
    if references.is_empty() {
        entry
    } else {
        format!("{entry}, {}", references.join(", "))
    }
}

/// Writes the breaking section followed by one section per commit type.
fn write_sections(out: &mut String, data: &TemplateData, entry: impl Fn(&Change) -> String) {
    if !data.breaking.is_empty() {
        let _ = writeln!(out, "\n### {}\n", data.locale.breaking_title());
        for breaking in &data.breaking {
            let _ = writeln!(out, "- {}", breaking.summary);
            if let Some(notes) = &breaking.notes {
                for line in notes.lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
        }
    }

    for group in group_changes(&data.changes) {
        let _ = writeln!(
            out,
            "\n### {}\n",
            data.locale.section_title(group.commit_type)
        );
        for change in group.changes {
            let _ = writeln!(out, "- {}", entry(change));
        }
    }
}

fn corporate_document(
    data: &TemplateData,
    platform: Option<Platform>,
    highlights: Option<&str>,
) -> String {
    let links = LinkWriter::new(data.repository.as_ref(), platform);
    let mut out = format!("## {} ({})\n", data.title(), data.date);

    if let Some(highlights) = highlights {
        let _ = writeln!(out, "\n### {}\n", data.locale.highlights_title());
        let _ = writeln!(out, "{highlights}");
    }

    write_sections(&mut out, data, |change| {
        let mut entry = format!("{} ({})", capitalize(&change.subject), links.commit(change));
        let references = links.references(change);
        if !references.is_empty() {
            let _ = write!(entry, " {}", references.join(" "));
        }
        entry
    });
    out
}

/// Audience-facing notes: capitalized subjects, no scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Corporate;

#[async_trait]
impl Template for Corporate {
    fn id(&self) -> &str {
        "corporate"
    }

    fn version(&self) -> &str {
        TEMPLATE_VERSION
    }

    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String> {
        Ok(corporate_document(data, platform, None))
    }
}

/// [`Corporate`] with a generated highlights section.
pub struct CorporateAi {
    enhancer: Box<dyn SummaryEnhancer>,
}

impl CorporateAi {
    #[must_use]
    pub fn new(enhancer: Box<dyn SummaryEnhancer>) -> Self {
        Self { enhancer }
    }
}

impl Default for CorporateAi {
    fn default() -> Self {
        Self::new(Box::new(HighlightsEnhancer::default()))
    }
}

#[async_trait]
impl Template for CorporateAi {
    fn id(&self) -> &str {
        "corporate-ai"
    }

    fn version(&self) -> &str {
        TEMPLATE_VERSION
    }

    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String> {
        let highlights = self.enhancer.summarize(data).await?;
        Ok(corporate_document(data, platform, highlights.as_deref()))
    }
}

/// Developer-facing notes with scopes, links, range and comparison URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Technical;

impl Technical {
    fn tag(data: &TemplateData, version: &str) -> String {
        match &data.package {
            Some(package) => format!("{package}-v{version}"),
            None => format!("v{version}"),
        }
    }
}

#[async_trait]
impl Template for Technical {
    fn id(&self) -> &str {
        "technical"
    }

    fn version(&self) -> &str {
        TEMPLATE_VERSION
    }

    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String> {
        let links = LinkWriter::new(data.repository.as_ref(), platform);

        let comparison = data.previous_version.as_deref().and_then(|previous| {
            links.comparison(&Self::tag(data, previous), &Self::tag(data, &data.version))
        });
        let mut out = match comparison {
            Some(url) => format!("## [{}]({url}) - {}\n", data.title(), data.date),
            None => format!("## [{}] - {}\n", data.title(), data.date),
        };
        let _ = writeln!(out, "\n_Range: `{}`_", data.range);

        write_sections(&mut out, data, |change| {
            let subject = match &change.scope {
                Some(scope) => format!("**{scope}:** {}", change.subject),
                None => change.subject.clone(),
            };
            let entry = format!("{subject} ({})", links.commit(change));
            with_references(entry, &links.references(change))
        });
        Ok(out)
    }
}

/// One line per change, no section headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compact;

#[async_trait]
impl Template for Compact {
    fn id(&self) -> &str {
        "compact"
    }

    fn version(&self) -> &str {
        TEMPLATE_VERSION
    }

    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String> {
        let links = LinkWriter::new(data.repository.as_ref(), platform);
        let mut out = format!("**{}** ({})\n\n", data.title(), data.date);

        for group in group_changes(&data.changes) {
            for change in group.changes {
                let marker = if change.is_breaking() { "!" } else { "" };
                let prefix = match &change.scope {
                    Some(scope) => format!("{}({scope}){marker}", change.commit_type),
                    None => format!("{}{marker}", change.commit_type),
                };
                let _ = writeln!(
                    out,
                    "- {prefix}: {} ({})",
                    change.subject,
                    links.commit(change)
                );
            }
        }
        Ok(out)
    }
}
