// Corpus module
// Curriculum documents on disk, their pages, and subject labeling

pub mod loader;
pub mod subject;

pub use loader::load_pages;
pub use subject::{normalize_subject, resolve_subject, subject_from_filename};

use std::path::PathBuf;

/// A curriculum document to be indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    pub path: PathBuf,
    /// Explicit subject label. When absent, the subject is derived from the
    /// `<subject>_<rest>` filename convention.
    pub subject: Option<String>,
}

impl DocumentSource {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subject: None,
        }
    }

    #[inline]
    pub fn with_subject(path: impl Into<PathBuf>, subject: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subject: Some(subject.into()),
        }
    }
}

/// A single page of a loaded document. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Plain text content of the page.
    pub text: String,
    /// 1-based page number within the source document.
    pub number: u32,
    /// Normalized subject label stamped from the document.
    pub subject: String,
    /// File name of the source document.
    pub source: String,
}
