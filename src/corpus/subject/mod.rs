
use std::path::Path;

use crate::corpus::DocumentSource;
use crate::{CurriculumError, Result};

/// Normalize a subject label for storage and matching.
#[inline]
pub fn normalize_subject(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Resolve the subject for a document: an explicit label wins, otherwise the
/// filename convention applies.
#[inline]
pub fn resolve_subject(source: &DocumentSource) -> Result<String> {
    match &source.subject {
        Some(subject) => {
            let normalized = normalize_subject(subject);
            if normalized.is_empty() {
                return Err(CurriculumError::Config(format!(
                    "Blank subject label for document: {}",
                    source.path.display()
                )));
            }
            Ok(normalized)
        }
        None => subject_from_filename(&source.path),
    }
}

/// Derive the subject from a `<subject>_<rest>` filename.
///
/// This is a strict input contract: a filename without the `_` delimiter is
/// rejected rather than silently mislabeled.
#[inline]
pub fn subject_from_filename(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            CurriculumError::Config(format!("Invalid document filename: {}", path.display()))
        })?;

    let Some((prefix, _)) = stem.split_once('_') else {
        return Err(CurriculumError::Config(format!(
            "Document filename {stem:?} does not follow the <subject>_<name> convention"
        )));
    };

    let subject = normalize_subject(prefix);
    if subject.is_empty() {
        return Err(CurriculumError::Config(format!(
            "Document filename {stem:?} has an empty subject prefix"
        )));
    }

    Ok(subject)
}
