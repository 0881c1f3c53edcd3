use super::*;
use tempfile::TempDir;

fn test_record(id: u32, subject: &str, content: &str, vector: Vec<f32>) -> EmbeddingRecord {
    EmbeddingRecord {
        id: format!("record-{id}"),
        vector,
        metadata: ChunkMetadata {
            subject: subject.to_string(),
            source: format!("{subject}_book.txt"),
            page_number: 1,
            chunk_index: 0,
            seq: id,
            content: content.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        },
    }
}

#[tokio::test]
async fn open_creates_directory() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = temp_dir.path().join("index");

    let store = VectorStore::open(&path).await.expect("should open store");

    assert!(path.exists());
    assert!(!store.has_table().await.expect("should check table"));
}

#[tokio::test]
async fn replace_all_stores_records() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let records = vec![
        test_record(0, "mathematics", "quadratic equations", vec![1.0, 0.0, 0.0, 0.0]),
        test_record(1, "mathematics", "linear functions", vec![0.9, 0.1, 0.0, 0.0]),
        test_record(2, "biology", "mitochondria", vec![0.0, 0.0, 1.0, 0.0]),
    ];

    store
        .replace_all(records)
        .await
        .expect("should store records");

    assert!(store.has_table().await.expect("should check table"));
    assert_eq!(store.count().await.expect("should count"), 3);
}

#[tokio::test]
async fn replace_all_overwrites_previous_collection() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    store
        .replace_all(vec![test_record(0, "physics", "waves", vec![1.0, 0.0])])
        .await
        .expect("should store first batch");

    store
        .replace_all(vec![
            test_record(0, "chemistry", "atoms", vec![1.0, 0.0, 0.0]),
            test_record(1, "chemistry", "bonds", vec![0.0, 1.0, 0.0]),
        ])
        .await
        .expect("should overwrite with second batch");

    assert_eq!(store.count().await.expect("should count"), 2);

    let results = store
        .search(&[1.0, 0.0, 0.0], "physics", 10)
        .await
        .expect("search should succeed");
    assert!(results.is_empty(), "old subject should be gone");
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let result = store.replace_all(vec![]).await;
    assert!(matches!(result, Err(CurriculumError::Index(_))));
}

#[tokio::test]
async fn mismatched_dimensions_are_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let result = store
        .replace_all(vec![
            test_record(0, "physics", "waves", vec![1.0, 0.0]),
            test_record(1, "physics", "optics", vec![1.0, 0.0, 0.0]),
        ])
        .await;

    assert!(matches!(result, Err(CurriculumError::Index(_))));
}

#[tokio::test]
async fn search_filters_by_subject() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let records = vec![
        test_record(0, "mathematics", "quadratic equations", vec![1.0, 0.0, 0.0, 0.0]),
        test_record(1, "mathematics", "linear functions", vec![0.9, 0.1, 0.0, 0.0]),
        test_record(2, "biology", "mitochondria", vec![1.0, 0.0, 0.0, 0.0]),
    ];
    store
        .replace_all(records)
        .await
        .expect("should store records");

    let results = store
        .search(&[1.0, 0.0, 0.0, 0.0], "mathematics", 10)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.metadata.subject, "mathematics");
    }
}

#[tokio::test]
async fn search_orders_by_similarity() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let records = vec![
        test_record(0, "mathematics", "far", vec![0.0, 1.0, 0.0]),
        test_record(1, "mathematics", "near", vec![1.0, 0.0, 0.0]),
        test_record(2, "mathematics", "middle", vec![0.7, 0.7, 0.0]),
    ];
    store
        .replace_all(records)
        .await
        .expect("should store records");

    let results = store
        .search(&[1.0, 0.0, 0.0], "mathematics", 3)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].metadata.content, "near");
    assert_eq!(results[1].metadata.content, "middle");
    assert_eq!(results[2].metadata.content, "far");
    assert!(results[0].distance <= results[1].distance);
    assert!(results[1].distance <= results[2].distance);
}

#[tokio::test]
async fn ties_break_on_insertion_order() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    let records = vec![
        test_record(0, "english", "first inserted", vec![1.0, 0.0]),
        test_record(1, "english", "second inserted", vec![1.0, 0.0]),
    ];
    store
        .replace_all(records)
        .await
        .expect("should store records");

    let results = store
        .search(&[1.0, 0.0], "english", 2)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].metadata.content, "first inserted");
    assert_eq!(results[1].metadata.content, "second inserted");
}

#[tokio::test]
async fn fewer_matches_than_limit_returns_all() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    store
        .replace_all(vec![test_record(0, "physics", "waves", vec![1.0, 0.0])])
        .await
        .expect("should store records");

    let results = store
        .search(&[1.0, 0.0], "physics", 10)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn drop_all_removes_table() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut store = VectorStore::open(temp_dir.path())
        .await
        .expect("should open store");

    store
        .replace_all(vec![test_record(0, "physics", "waves", vec![1.0, 0.0])])
        .await
        .expect("should store records");

    store.drop_all().await.expect("should drop table");
    assert!(!store.has_table().await.expect("should check table"));

    // Dropping again is a no-op
    store.drop_all().await.expect("should tolerate empty store");
}
