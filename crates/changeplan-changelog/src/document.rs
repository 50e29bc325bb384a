use std::path::Path;

use crate::Result;
use crate::error::TemplateError;

const HEADER: &str = "# Changelog\n\nAll notable changes to this project will be documented in this file.\n";

/// A changelog file that new releases are prepended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    content: String,
}

impl Default for ChangelogDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangelogDocument {
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: HEADER.to_string(),
        }
    }

    #[must_use]
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Reads `path`, starting a fresh document if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Read` if the file exists but cannot be read.
    pub fn open(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self { content }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(source) => Err(TemplateError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Inserts a rendered release above the newest existing one.
    pub fn add_release(&mut self, rendered: &str) {
        let insertion_point = self.insertion_point();
        let (head, rest) = self.content.split_at(insertion_point);

        let mut content = String::with_capacity(self.content.len() + rendered.len() + 2);
        content.push_str(head);
        if !content.is_empty() && !content.ends_with("\n\n") {
            content.push_str(if content.ends_with('\n') { "\n" } else { "\n\n" });
        }
        content.push_str(rendered.trim_end());
        content.push('\n');
        if !rest.is_empty() {
            content.push('\n');
            content.push_str(rest.trim_start_matches('\n'));
        }

        self.content = content;
    }

    fn insertion_point(&self) -> usize {
        if self.content.starts_with("## ") {
            return 0;
        }
        if let Some(first_release) = self.content.find("\n## ") {
            return first_release + 1;
        }
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_gets_release_after_header() {
        let mut doc = ChangelogDocument::new();

        doc.add_release("## 1.0.0 (2025-01-01)\n\n- First\n");

        assert_eq!(
            doc.content(),
            format!("{HEADER}\n## 1.0.0 (2025-01-01)\n\n- First\n")
        );
    }

    #[test]
    fn newer_release_goes_above_older_one() {
        let mut doc = ChangelogDocument::new();
        doc.add_release("## 1.0.0 (2025-01-01)\n\n- First\n");

        doc.add_release("## 1.1.0 (2025-02-01)\n\n- Second\n");

        let newer = doc.content().find("## 1.1.0").expect("newer release");
        let older = doc.content().find("## 1.0.0").expect("older release");
        assert!(newer < older);
        assert!(doc.content().starts_with("# Changelog"));
    }

    #[test]
    fn missing_file_starts_fresh() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let doc = ChangelogDocument::open(&dir.path().join("CHANGELOG.md"))?;

        assert_eq!(doc, ChangelogDocument::new());
        Ok(())
    }
}
