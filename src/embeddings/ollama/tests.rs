use super::*;
use crate::config::EmbeddingConfig;

#[test]
fn client_configuration() {
    let config = EmbeddingConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = EmbeddingConfig::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn embed_request_serialization() {
    let request = EmbedRequest {
        model: "nomic-embed-text:latest".to_string(),
        prompt: "what is a quadratic equation?".to_string(),
    };

    let json = serde_json::to_string(&request).expect("should serialize");
    assert!(json.contains("\"model\":\"nomic-embed-text:latest\""));
    assert!(json.contains("\"prompt\":\"what is a quadratic equation?\""));
}

#[test]
fn batch_request_uses_input_field() {
    let request = BatchEmbedRequest {
        model: "nomic-embed-text:latest".to_string(),
        inputs: vec!["one".to_string(), "two".to_string()],
    };

    let json = serde_json::to_string(&request).expect("should serialize");
    assert!(json.contains("\"input\":[\"one\",\"two\"]"));
}

#[test]
fn embed_response_parsing() {
    let json = r#"{"embedding": [0.1, 0.2, 0.3]}"#;
    let response: EmbedResponse = serde_json::from_str(json).expect("should parse");
    assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
}

#[test]
fn batch_response_parsing() {
    let json = r#"{"embeddings": [[0.1, 0.2], [0.3, 0.4]]}"#;
    let response: BatchEmbedResponse = serde_json::from_str(json).expect("should parse");
    assert_eq!(response.embeddings.len(), 2);
    assert_eq!(response.embeddings[1], vec![0.3, 0.4]);
}

#[test]
fn models_response_parsing() {
    let json = r#"{
        "models": [
            {"name": "nomic-embed-text:latest", "size": 274302450, "digest": "abc123"},
            {"name": "llama3:latest"}
        ]
    }"#;
    let response: ModelsResponse = serde_json::from_str(json).expect("should parse");
    assert_eq!(response.models.len(), 2);
    assert_eq!(response.models[0].name, "nomic-embed-text:latest");
    assert!(response.models[1].size.is_none());
}

#[test]
fn embedding_result_structure() {
    let result = EmbeddingResult {
        text: "test text".to_string(),
        embedding: vec![0.1, 0.2, 0.3, 0.4, 0.5],
    };

    assert_eq!(result.text, "test text");
    assert_eq!(result.embedding.len(), 5);
}
