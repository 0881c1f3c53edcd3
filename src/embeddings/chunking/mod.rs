
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::Page;
use crate::{CurriculumError, Result};

/// A bounded window of page text, the unit of indexing and retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct PageChunk {
    /// The chunk text.
    pub text: String,
    /// Subject inherited from the source page.
    pub subject: String,
    /// Source document file name inherited from the page.
    pub source: String,
    /// Page number inherited from the page.
    pub page_number: u32,
    /// The index of this chunk within its page.
    pub chunk_index: usize,
}

/// Configuration for page chunking. All sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum window size.
    pub chunk_size: usize,
    /// Characters shared between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Split pages into overlapping windows, each carrying its page's metadata.
#[inline]
pub fn split_pages(pages: &[Page], config: &ChunkingConfig) -> Result<Vec<PageChunk>> {
    if config.chunk_size == 0 || config.overlap >= config.chunk_size {
        return Err(CurriculumError::Config(format!(
            "Invalid chunking configuration: chunk size {}, overlap {}",
            config.chunk_size, config.overlap
        )));
    }

    let mut chunks = Vec::new();

    for page in pages {
        for (chunk_index, text) in split_text(&page.text, config).into_iter().enumerate() {
            chunks.push(PageChunk {
                text,
                subject: page.subject.clone(),
                source: page.source.clone(),
                page_number: page.number,
                chunk_index,
            });
        }
    }

    debug!("Chunked {} pages into {} chunks", pages.len(), chunks.len());

    Ok(chunks)
}

/// Sliding windows over `text`.
///
/// Each window is at most `chunk_size` chars and consecutive windows share
/// `overlap` trailing/leading chars. The window end prefers a paragraph
/// break, then a sentence end, then a word boundary, before a hard cut, so
/// only the final overlap can come up short (when a boundary forces a window
/// no longer than the overlap itself).
fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total == 0 {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = usize::min(start + config.chunk_size, total);
        let end = if hard_end == total {
            total
        } else {
            window_end(&chars, start, hard_end)
        };

        windows.push(chars[start..end].iter().collect());

        if end == total {
            break;
        }

        start = if end - start > config.overlap {
            end - config.overlap
        } else {
            end
        };
    }

    windows
}

/// Pick the window end in `(start, hard_end]`, preferring natural boundaries.
fn window_end(chars: &[char], start: usize, hard_end: usize) -> usize {
    // Paragraph break: window ends right after a blank line
    if let Some(end) = rfind_break(chars, start, hard_end, |chars, p| {
        p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n'
    }) {
        return end;
    }

    // Sentence end: terminal punctuation followed by whitespace
    if let Some(end) = rfind_break(chars, start, hard_end, |chars, p| {
        matches!(chars[p - 1], '.' | '!' | '?') && chars.get(p).is_none_or(|c| c.is_whitespace())
    }) {
        return end;
    }

    // Word boundary
    if let Some(end) = rfind_break(chars, start, hard_end, |chars, p| {
        chars[p - 1].is_whitespace()
    }) {
        return end;
    }

    hard_end
}

fn rfind_break<F>(chars: &[char], start: usize, hard_end: usize, pred: F) -> Option<usize>
where
    F: Fn(&[char], usize) -> bool,
{
    (start + 1..=hard_end).rev().find(|&p| pred(chars, p))
}
