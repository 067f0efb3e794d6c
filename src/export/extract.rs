use std::path::Path;

use tracing::debug;

use crate::types::{CourseError, Result};

/// Source of plain text for topic extraction
pub trait TextExtractor: Send + Sync {
    /// Read the document and return its text content
    fn extract_text(&self, path: &Path) -> Result<String>;

    /// Whether this extractor handles the file (by extension)
    fn supports(&self, path: &Path) -> bool;
}

/// Extractor for UTF-8 text documents (`.txt`, `.md`, `.markdown`)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        if !self.supports(path) {
            return Err(CourseError::Extraction(format!(
                "Unsupported document type: {} (supported: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| {
            CourseError::Extraction(format!("{} is not valid UTF-8 text", path.display()))
        })?;

        if text.trim().is_empty() {
            return Err(CourseError::Extraction(format!(
                "{} contains no text",
                path.display()
            )));
        }

        debug!(path = %path.display(), chars = text.len(), "Extracted document text");
        Ok(text)
    }

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}
