//! Templates loaded from TOML files.
//!
//! ```toml
//! version = "1.0"
//!
//! [render]
//! header = "# {title} ({date})"
//! section = "## {title}"
//! entry = "* {subject} [{short_sha}]"
//! breaking = "* **{summary}**"
//! footer = "Range: {range}"
//! ```

use std::fmt::Write;
use std::path::Path;

use async_trait::async_trait;
use changeplan_core::Platform;
use serde::Deserialize;

use crate::Result;
use crate::data::TemplateData;
use crate::error::TemplateError;
use crate::group::group_changes;
use crate::links::{LinkWriter, short_sha};
use crate::template::{TEMPLATE_VERSION, Template};

#[derive(Debug, Deserialize)]
struct TemplateUnit {
    id: Option<String>,
    version: String,
    render: Option<RenderSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RenderSpec {
    header: String,
    #[serde(default = "default_section")]
    section: String,
    entry: String,
    breaking: Option<String>,
    footer: Option<String>,
}

fn default_section() -> String {
    "### {title}".to_string()
}

/// Replaces each `{name}` placeholder in `pattern` with its value in a single
/// pass. Substituted text is never scanned again; unknown placeholders are
/// kept as written.
fn fill(pattern: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let known = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match known {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTemplate {
    id: String,
    version: String,
    spec: RenderSpec,
}

impl ExternalTemplate {
    /// Parses a template unit, checking the version before the render section.
    ///
    /// `id` names the template in errors and is used when the unit does not
    /// declare its own.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Parse` for malformed TOML,
    /// `TemplateError::UnsupportedVersion` for a version other than
    /// [`TEMPLATE_VERSION`] and `TemplateError::MissingRender` when the unit
    /// has no `[render]` table.
    pub fn parse(id: &str, path: &Path, contents: &str) -> Result<Self> {
        let unit: TemplateUnit = toml::from_str(contents).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if unit.version != TEMPLATE_VERSION {
            return Err(TemplateError::UnsupportedVersion {
                id: id.to_string(),
                found: unit.version,
                expected: TEMPLATE_VERSION,
            });
        }

        let spec = unit.render.ok_or_else(|| TemplateError::MissingRender {
            id: id.to_string(),
        })?;

        Ok(Self {
            id: unit.id.unwrap_or_else(|| id.to_string()),
            version: unit.version,
            spec,
        })
    }

    /// Reads and parses the template unit at `path`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` if the file does not exist, `Read`
    /// for other I/O failures and any error from [`ExternalTemplate::parse`].
    pub async fn load(path: &Path) -> Result<Self> {
        let id = path.display().to_string();
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound { id });
            }
            Err(source) => {
                return Err(TemplateError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let template = Self::parse(&id, path, &contents)?;
        tracing::debug!(id = %template.id, path = %path.display(), "loaded template");
        Ok(template)
    }

    fn render_document(&self, data: &TemplateData, platform: Option<Platform>) -> String {
        let links = LinkWriter::new(data.repository.as_ref(), platform);
        let range = data.range.to_string();
        let date = data.date.to_string();
        let title = data.title();

        let mut out = fill(
            &self.spec.header,
            &[
                ("title", title.as_str()),
                ("version", data.version.as_str()),
                ("previous_version", data.previous_version.as_deref().unwrap_or("")),
                ("date", date.as_str()),
                ("package", data.package.as_deref().unwrap_or("")),
                ("range", range.as_str()),
            ],
        );
        out.push('\n');

        if let Some(pattern) = &self.spec.breaking {
            if !data.breaking.is_empty() {
                let heading = fill(&self.spec.section, &[("title", data.locale.breaking_title())]);
                let _ = writeln!(out, "\n{heading}\n");
                for breaking in &data.breaking {
                    let line = fill(
                        pattern,
                        &[
                            ("summary", breaking.summary.as_str()),
                            ("notes", breaking.notes.as_deref().unwrap_or("")),
                        ],
                    );
                    let _ = writeln!(out, "{line}");
                }
            }
        }

        for group in group_changes(&data.changes) {
            let heading = fill(
                &self.spec.section,
                &[("title", data.locale.section_title(group.commit_type))],
            );
            let _ = writeln!(out, "\n{heading}\n");
            for change in group.changes {
                let commit = links.commit(change);
                let references = links.references(change).join(", ");
                let author = change.author.to_string();
                let line = fill(
                    &self.spec.entry,
                    &[
                        ("type", change.commit_type.as_str()),
                        ("scope", change.scope.as_deref().unwrap_or("")),
                        ("subject", change.subject.as_str()),
                        ("short_sha", short_sha(&change.sha)),
                        ("sha", change.sha.as_str()),
                        ("commit", commit.as_str()),
                        ("references", references.as_str()),
                        ("author", author.as_str()),
                    ],
                );
                let _ = writeln!(out, "{line}");
            }
        }

        if let Some(footer) = &self.spec.footer {
            let footer = fill(footer, &[("range", range.as_str()), ("date", date.as_str())]);
            let _ = writeln!(out, "\n{footer}");
        }
        out
    }
}

#[async_trait]
impl Template for ExternalTemplate {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    async fn render(&self, data: &TemplateData, platform: Option<Platform>) -> Result<String> {
        Ok(self.render_document(data, platform))
    }
}
