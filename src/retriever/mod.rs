// Retriever module
// Subject-filtered nearest-neighbor retrieval over the vector index


use std::sync::Arc;

use tracing::debug;

use crate::corpus::normalize_subject;
use crate::embeddings::EmbeddingProvider;
use crate::index::{CurriculumIndex, SearchResult};
use crate::{CurriculumError, Result};

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieves the chunks most relevant to a question within one subject.
pub struct Retriever {
    index: Arc<CurriculumIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    #[inline]
    pub fn new(index: Arc<CurriculumIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Return the top-`k` chunk texts for `text`, restricted to `subject`.
    ///
    /// The subject filter is exact equality after normalization; fewer than
    /// `k` matching chunks returns all of them. Fails with `NotInitialized`
    /// before a successful build.
    #[inline]
    pub async fn query(&self, text: &str, subject: &str, k: usize) -> Result<Vec<String>> {
        let results = self.search(text, subject, k).await?;
        Ok(results.into_iter().map(|r| r.metadata.content).collect())
    }

    /// Like [`Self::query`], keeping full result metadata and scores.
    #[inline]
    pub async fn search(&self, text: &str, subject: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(CurriculumError::Config(
                "Result count k must be at least 1".to_string(),
            ));
        }

        let subject = normalize_subject(subject);
        if subject.is_empty() {
            return Err(CurriculumError::Config(
                "Subject filter cannot be blank".to_string(),
            ));
        }

        // Embed outside the index lock; the call may block on the service
        let query_vector = self.embedder.embed(text)?;

        debug!(
            "Retrieving top {} chunks for subject {} (query length: {})",
            k,
            subject,
            text.len()
        );

        self.index.search(&query_vector, &subject, k).await
    }
}
