// Indexer module
// Builds the subject-partitioned vector index from curriculum documents


use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::corpus::{self, DocumentSource};
use crate::embeddings::EmbeddingProvider;
use crate::embeddings::chunking::{ChunkingConfig, split_pages};
use crate::index::{ChunkMetadata, CurriculumIndex, EmbeddingRecord};
use crate::{CurriculumError, Result};

/// Builds the vector index from curriculum documents.
///
/// A build processes every document or none: any load or parse failure
/// aborts the whole build, and a previously ready index keeps serving until
/// the new record set is swapped in.
pub struct CorpusIndexer {
    index: Arc<CurriculumIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
}

/// Statistics about a completed build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingStats {
    pub documents_indexed: usize,
    pub pages_loaded: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
}

impl CorpusIndexer {
    #[inline]
    pub fn new(
        index: Arc<CurriculumIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chunking,
        }
    }

    /// Build the index from `sources`, replacing any previous collection.
    #[inline]
    pub async fn build(&self, sources: &[DocumentSource]) -> Result<IndexingStats> {
        if sources.is_empty() {
            return Err(CurriculumError::Config(
                "No documents supplied for indexing".to_string(),
            ));
        }

        let mut stats = IndexingStats::default();
        let mut all_chunks = Vec::new();

        for source in sources {
            let pages = corpus::load_pages(source)?;
            stats.pages_loaded += pages.len();

            let chunks = split_pages(&pages, &self.chunking)?;
            debug!(
                "Document {} produced {} chunks",
                source.path.display(),
                chunks.len()
            );

            all_chunks.extend(chunks);
            stats.documents_indexed += 1;
        }

        if all_chunks.is_empty() {
            return Err(CurriculumError::Config(
                "Documents produced no indexable chunks".to_string(),
            ));
        }
        stats.chunks_created = all_chunks.len();

        // Embed the whole corpus in one batched pass, before any index lock
        let texts: Vec<String> = all_chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;

        if vectors.len() != all_chunks.len() {
            return Err(CurriculumError::Embedding(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                all_chunks.len(),
                vectors.len()
            )));
        }
        stats.embeddings_generated = vectors.len();

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<EmbeddingRecord> = all_chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(seq, (chunk, vector))| EmbeddingRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    subject: chunk.subject,
                    source: chunk.source,
                    page_number: chunk.page_number,
                    chunk_index: chunk.chunk_index as u32,
                    seq: seq as u32,
                    content: chunk.text,
                    created_at: created_at.clone(),
                },
            })
            .collect();

        self.index.rebuild(records).await?;

        info!(
            "Indexed {} documents: {} pages, {} chunks, {} embeddings",
            stats.documents_indexed,
            stats.pages_loaded,
            stats.chunks_created,
            stats.embeddings_generated
        );

        Ok(stats)
    }

    /// Delete the persisted collection. Safe to call when no index exists.
    #[inline]
    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await
    }
}
