// Vector index module
// Persisted chunk records and the index lifecycle handle


pub mod vector_store;

pub use vector_store::{SearchResult, VectorStore};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{CurriculumError, Result};

/// Embedding record stored in the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this record
    pub id: String,
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Normalized subject label, the index partition key
    pub subject: String,
    /// File name of the source document
    pub source: String,
    /// 1-based page number within the source document
    pub page_number: u32,
    /// Index of this chunk within its page
    pub chunk_index: u32,
    /// Insertion ordinal across the whole build, used for stable tie-breaks
    pub seq: u32,
    /// The chunk text
    pub content: String,
    /// Timestamp when this record was created
    pub created_at: String,
}

/// Owned lifecycle handle for the process-wide vector index.
///
/// State moves through `uninitialized -> ready -> (rebuilding) -> ready`
/// or back to uninitialized after a clear. Queries take read locks and run
/// in parallel; a rebuild or clear takes the write lock, so queries
/// serialize behind it and never observe a partially built index.
pub struct CurriculumIndex {
    path: PathBuf,
    state: RwLock<Option<VectorStore>>,
}

impl CurriculumIndex {
    /// Create a handle with no backing store.
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(None),
        }
    }

    /// Create a handle, attaching to a previously persisted index when one
    /// exists at `path`.
    #[inline]
    pub async fn attach(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!("No persisted index at {:?}, starting uninitialized", path);
            return Ok(Self::new(path));
        }

        let store = VectorStore::open(&path).await?;
        let state = if store.has_table().await? {
            info!("Attached to persisted index at {:?}", path);
            Some(store)
        } else {
            debug!("Index directory {:?} holds no records yet", path);
            None
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Atomically replace the index contents with a freshly built record set.
    ///
    /// The on-disk collection is overwritten in one operation. On failure the
    /// handle reverts to uninitialized rather than exposing a partial index.
    #[inline]
    pub async fn rebuild(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let mut guard = self.state.write().await;

        let mut store = VectorStore::open(&self.path).await?;
        if let Err(e) = store.replace_all(records).await {
            *guard = None;
            return Err(e);
        }

        *guard = Some(store);
        Ok(())
    }

    /// Subject-filtered nearest-neighbor search over the ready index.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        subject: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let guard = self.state.read().await;
        let store = guard.as_ref().ok_or(CurriculumError::NotInitialized)?;
        store.search(query_vector, subject, limit).await
    }

    /// Number of records in the ready index.
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let guard = self.state.read().await;
        let store = guard.as_ref().ok_or(CurriculumError::NotInitialized)?;
        store.count().await
    }

    /// Delete the entire persisted collection and release the in-memory
    /// handle. Safe to call when no index exists.
    #[inline]
    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.state.write().await;

        if let Some(mut store) = guard.take() {
            store.drop_all().await?;
        }

        if self.path.exists() {
            std::fs::remove_dir_all(&self.path).map_err(|e| {
                CurriculumError::Index(format!(
                    "Failed to remove index directory {:?}: {}",
                    self.path, e
                ))
            })?;
        }

        info!("Cleared index at {:?}", self.path);
        Ok(())
    }
}
