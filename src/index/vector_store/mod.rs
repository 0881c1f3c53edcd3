#[cfg(test)]
mod tests;

use super::{ChunkMetadata, EmbeddingRecord};
use crate::{CurriculumError, Result};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "chunks";

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: Option<usize>,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub metadata: ChunkMetadata,
    pub similarity: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (or create) a store backed by the given directory.
    #[inline]
    pub async fn open(path: &Path) -> Result<Self> {
        debug!("Opening LanceDB at path: {:?}", path);

        std::fs::create_dir_all(path).map_err(|e| {
            CurriculumError::Index(format!("Failed to create index directory: {}", e))
        })?;

        let uri = format!("file://{}", path.display());

        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension: None,
        })
    }

    /// Whether the chunk table has been created.
    #[inline]
    pub async fn has_table(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    /// Replace the entire collection with `records` in one operation.
    ///
    /// The vector dimension is taken from the first record; any previously
    /// persisted table is dropped first.
    #[inline]
    pub async fn replace_all(&mut self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let Some(first) = records.first() else {
            return Err(CurriculumError::Index(
                "Cannot build an index with no records".to_string(),
            ));
        };

        let vector_dim = first.vector.len();
        if vector_dim == 0 {
            return Err(CurriculumError::Index(
                "Embedding vectors must not be empty".to_string(),
            ));
        }

        for record in &records {
            if record.vector.len() != vector_dim {
                return Err(CurriculumError::Index(format!(
                    "Inconsistent embedding dimensions: expected {}, got {}",
                    vector_dim,
                    record.vector.len()
                )));
            }
        }

        debug!(
            "Replacing collection with {} records ({} dimensions)",
            records.len(),
            vector_dim
        );

        self.drop_table_if_exists().await?;
        self.vector_dimension = Some(vector_dim);

        let schema = self.create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to create table: {}", e)))?;

        let record_batch = self.create_record_batch(&records, &schema)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to open table: {}", e)))?;

        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to insert records: {}", e)))?;

        info!("Stored {} records in vector index", records.len());
        Ok(())
    }

    /// Create the table schema for the given vector dimension
    fn create_schema(&self, vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("subject", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("page_number", DataType::UInt32, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("seq", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Create a RecordBatch from embedding records
    fn create_record_batch(
        &self,
        records: &[EmbeddingRecord],
        schema: &Arc<Schema>,
    ) -> Result<RecordBatch> {
        let len = records.len();
        let vector_dim = self
            .vector_dimension
            .ok_or_else(|| CurriculumError::Index("Vector dimension not set".to_string()))?;

        let mut ids = Vec::with_capacity(len);
        let mut subjects = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut page_numbers = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut seqs = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        let mut flat_values = Vec::with_capacity(len * vector_dim);
        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            subjects.push(record.metadata.subject.as_str());
            sources.push(record.metadata.source.as_str());
            page_numbers.push(record.metadata.page_number);
            chunk_indices.push(record.metadata.chunk_index);
            seqs.push(record.metadata.seq);
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    CurriculumError::Index(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(subjects)),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(page_numbers)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(UInt32Array::from(seqs)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Arc::clone(schema), arrays)
            .map_err(|e| CurriculumError::Index(format!("Failed to create record batch: {}", e)))
    }

    /// Search for the nearest chunks within a single subject partition.
    ///
    /// Results are ordered by ascending cosine distance; ties break on the
    /// insertion ordinal so identical inputs always return the same order.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        subject: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            "Searching for similar chunks (subject: {}, limit: {})",
            subject, limit
        );

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to open table: {}", e)))?;

        let filter = format!("subject = '{}'", subject.replace('\'', "''"));

        let results = table
            .vector_search(query_vector)
            .map_err(|e| CurriculumError::Index(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .column("vector")
            .only_if(filter)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to execute search: {}", e)))?;

        let mut search_results = self.parse_search_results_stream(results).await?;

        search_results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.metadata.seq.cmp(&b.metadata.seq))
        });
        search_results.truncate(limit);

        Ok(search_results)
    }

    /// Parse search results from LanceDB stream into SearchResult structs
    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = self.parse_search_batch(&batch_result)?;
            search_results.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(&self, batch: &RecordBatch) -> Result<Vec<SearchResult>> {
        let mut search_results = Vec::new();
        let num_rows = batch.num_rows();

        let subjects = string_column(batch, "subject")?;
        let sources = string_column(batch, "source")?;
        let contents = string_column(batch, "content")?;
        let created_ats = string_column(batch, "created_at")?;
        let page_numbers = u32_column(batch, "page_number")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let seqs = u32_column(batch, "seq")?;

        // Extract distance scores if available
        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..num_rows {
            let metadata = ChunkMetadata {
                subject: subjects.value(row).to_string(),
                source: sources.value(row).to_string(),
                page_number: page_numbers.value(row),
                chunk_index: chunk_indices.value(row),
                seq: seqs.value(row),
                content: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            };

            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            // Convert distance to similarity score (higher is better)
            let similarity = 1.0 - distance;

            search_results.push(SearchResult {
                metadata,
                similarity,
                distance,
            });
        }

        Ok(search_results)
    }

    /// Get the total number of records stored
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Drop the chunk table, releasing every stored record.
    #[inline]
    pub async fn drop_all(&mut self) -> Result<()> {
        self.drop_table_if_exists().await?;
        self.vector_dimension = None;
        Ok(())
    }

    /// Drop the chunk table if it exists
    async fn drop_table_if_exists(&self) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| CurriculumError::Index(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            info!("Dropping existing chunk table");
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| CurriculumError::Index(format!("Failed to drop table: {}", e)))?;
        }

        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| CurriculumError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| CurriculumError::Index(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| CurriculumError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| CurriculumError::Index(format!("Invalid {} column type", name)))
}
