//! Integration tests - OpenAI and Pinecone clients over HTTP
//!
//! Each test stands up a local mock server and checks what the client
//! sends, how many times it sends it, and which `BotError` comes back.

use pensionbot::{
    errors::BotError,
    providers::{
        ChatCompletion, ChatMessage, Embedder, OpenAiClient, PineconeIndex, RetryPolicy,
        VectorIndex,
    },
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai(server: &MockServer, timeout: Duration, retry: RetryPolicy) -> OpenAiClient {
    OpenAiClient::new(&server.uri(), "sk-test", "text-embedding-3-large", timeout, retry).unwrap()
}

fn pinecone(server: &MockServer, retry: RetryPolicy) -> PineconeIndex {
    PineconeIndex::new(&server.uri(), "pc-key", Duration::from_secs(5), retry).unwrap()
}

async fn hits(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

fn embedding_body() -> serde_json::Value {
    json!({"data": [{"index": 0, "embedding": [0.25, -0.5, 1.0]}], "model": "text-embedding-3-large"})
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({"id": "chatcmpl-1", "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

// Embeddings

#[tokio::test]
async fn test_embedding_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "text-embedding-3-large", "input": ["What is PBGC?"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body()))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2));
    let vector = client.embed("What is PBGC?").await.unwrap();

    assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    assert_eq!(hits(&server).await, 2);
}

#[tokio::test]
async fn test_embedding_unauthorized_fails_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2));
    let err = client.embed("q").await.unwrap_err();

    match err {
        BotError::Api { service, status, body } => {
            assert_eq!(service, "openai");
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(hits(&server).await, 1);
}

#[tokio::test]
async fn test_embedding_without_data_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2));
    let err = client.embed("q").await.unwrap_err();

    assert!(matches!(err, BotError::InvalidResponse { .. }));
    assert_eq!(hits(&server).await, 1);
}

#[tokio::test]
async fn test_embedding_timeout_is_typed_and_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(embedding_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_millis(100), RetryPolicy::fixed(2, 1, 2));
    let err = client.embed("q").await.unwrap_err();

    match err {
        BotError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, BotError::Timeout { duration_ms: 100 }));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(hits(&server).await, 2);
}

// Completions

#[tokio::test]
async fn test_completion_sends_messages_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "You are an expert."},
                {"role": "user", "content": "Explain vesting"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Vesting is...")))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::none());
    let messages = [ChatMessage::system("You are an expert."), ChatMessage::user("Explain vesting")];
    let reply = client.complete("gpt-4o", &messages).await.unwrap();

    assert_eq!(reply, "Vesting is...");
}

#[tokio::test]
async fn test_completion_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2));
    let reply = client.complete("gpt-4o", &[ChatMessage::user("q")]).await.unwrap();

    assert_eq!(reply, "ok");
    assert_eq!(hits(&server).await, 3);
}

#[tokio::test]
async fn test_completion_timeout_is_not_resent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2))
        .with_completion_timeout(Duration::from_millis(100));
    let err = client.complete("o1-preview", &[ChatMessage::user("q")]).await.unwrap_err();

    assert!(matches!(err, BotError::Timeout { duration_ms: 100 }));
    assert!(err.is_timeout());
    assert_eq!(hits(&server).await, 1);
}

#[tokio::test]
async fn test_completion_deadline_outlasts_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("thought about it"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_millis(100), RetryPolicy::none())
        .with_completion_timeout(Duration::from_secs(5));
    let reply = client.complete("o1-preview", &[ChatMessage::user("q")]).await.unwrap();

    assert_eq!(reply, "thought about it");
}

#[tokio::test]
async fn test_completion_without_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = openai(&server, Duration::from_secs(5), RetryPolicy::fixed(3, 1, 2));
    let err = client.complete("gpt-4o", &[ChatMessage::user("q")]).await.unwrap_err();

    assert!(matches!(err, BotError::InvalidResponse { .. }));
    assert_eq!(hits(&server).await, 1);
}

// Pinecone

#[tokio::test]
async fn test_index_query_sends_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("Api-Key", "pc-key"))
        .and(body_partial_json(json!({
            "vector": [0.5, -0.25],
            "topK": 5,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": "plans"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"id": "para-12", "score": 0.91, "metadata": {"text": "Funding target is..."}},
                {"id": "para-7", "score": 0.88}
            ],
            "namespace": "plans"
        })))
        .mount(&server)
        .await;

    let index = pinecone(&server, RetryPolicy::none())
        .with_namespace(Some("plans".to_string()))
        .with_metadata(true);
    let matches = index.query(&[0.5, -0.25], 5).await.unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "para-12");
    assert_eq!(matches[0].metadata.as_ref().unwrap()["text"], "Funding target is...");
    assert!(matches[1].metadata.is_none());
}

#[tokio::test]
async fn test_index_query_retries_unavailable_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
        .mount(&server)
        .await;

    let index = pinecone(&server, RetryPolicy::fixed(3, 1, 2));
    let matches = index.query(&[1.0], 5).await.unwrap();

    assert!(matches.is_empty());
    assert_eq!(hits(&server).await, 2);
}

#[tokio::test]
async fn test_index_fetch_returns_metadata_for_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vectors/fetch"))
        .and(header("Api-Key", "pc-key"))
        .and(query_param("ids", "para-12"))
        .and(query_param("namespace", "plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vectors": {
                "para-12": {"id": "para-12", "values": [0.1], "metadata": {"text": "Normal cost is..."}}
            },
            "namespace": "plans"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vectors/fetch"))
        .and(query_param("ids", "missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vectors": {}})))
        .mount(&server)
        .await;

    let index = pinecone(&server, RetryPolicy::none()).with_namespace(Some("plans".to_string()));

    let metadata = index.fetch_metadata("para-12").await.unwrap().unwrap();
    assert_eq!(metadata["text"], "Normal cost is...");
    assert!(index.fetch_metadata("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_index_forbidden_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let index = pinecone(&server, RetryPolicy::fixed(3, 1, 2));
    let err = index.query(&[1.0], 5).await.unwrap_err();

    assert!(matches!(err, BotError::Api { status: 403, .. }));
    assert_eq!(hits(&server).await, 1);
}

#[tokio::test]
async fn test_describe_stats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dimension": 3072,
            "totalVectorCount": 420,
            "namespaces": {}
        })))
        .mount(&server)
        .await;

    let stats = pinecone(&server, RetryPolicy::none()).describe_stats().await.unwrap();
    assert_eq!(stats.dimension, Some(3072));
    assert_eq!(stats.total_vector_count, 420);
}
