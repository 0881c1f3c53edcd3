// Embeddings module
// Embedding service client, the provider seam, and page chunking

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, PageChunk, split_pages};
pub use ollama::{EmbeddingResult, OllamaClient};

use crate::Result;

/// Opaque embedding function: text in, fixed-length numeric vector out.
///
/// Assumed deterministic for a fixed model version. Implementations must not
/// hold any index-wide lock while a call is in flight.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
