#[cfg(test)]
mod tests;

use std::fs;

use pulldown_cmark::{Event, Parser, TagEnd};
use tracing::{debug, warn};

use crate::corpus::{DocumentSource, Page, subject};
use crate::{CurriculumError, Result};

/// Page separator used by PDF text extraction tools.
const PAGE_SEPARATOR: char = '\u{c}';

/// Load a document into subject-stamped pages.
///
/// Markdown is rendered to plain text before page splitting; plain text files
/// are taken as-is. Pages are separated by form feed characters; a document
/// without separators is a single page.
#[inline]
pub fn load_pages(source: &DocumentSource) -> Result<Vec<Page>> {
    let subject = subject::resolve_subject(source)?;

    let file_name = source
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            CurriculumError::Config(format!(
                "Invalid document filename: {}",
                source.path.display()
            ))
        })?
        .to_string();

    let raw = fs::read_to_string(&source.path).map_err(|e| {
        CurriculumError::Config(format!(
            "Failed to read document {}: {}",
            source.path.display(),
            e
        ))
    })?;

    let extension = source
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "md" | "markdown" => markdown_to_text(&raw),
        "txt" | "text" => raw,
        other => {
            return Err(CurriculumError::Config(format!(
                "Unsupported document type {:?} for {}",
                other,
                source.path.display()
            )));
        }
    };

    let mut pages = Vec::new();
    for (index, page_text) in text.split(PAGE_SEPARATOR).enumerate() {
        let number = index as u32 + 1;
        if page_text.trim().is_empty() {
            debug!("Skipping empty page {} of {}", number, file_name);
            continue;
        }
        pages.push(Page {
            text: page_text.to_string(),
            number,
            subject: subject.clone(),
            source: file_name.clone(),
        });
    }

    if pages.is_empty() {
        warn!("Document {} contains no readable pages", file_name);
        return Err(CurriculumError::Config(format!(
            "Document {} contains no readable pages",
            source.path.display()
        )));
    }

    debug!(
        "Loaded {} pages from {} (subject: {})",
        pages.len(),
        file_name,
        subject
    );

    Ok(pages)
}

/// Render markdown to plain text, keeping paragraph structure.
fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(content) | Event::Code(content) => text.push_str(&content),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => {
                text.push_str("\n\n");
            }
            _ => {}
        }
    }

    text.trim_end().to_string()
}
