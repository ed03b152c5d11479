//! External service clients
//!
//! The chat tool talks to three services: an embedding model, a vector
//! index and a chat-completion model. Each sits behind an `async_trait`
//! so the pipeline can be driven by in-memory doubles in tests.

pub mod openai;
pub mod pinecone;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::errors::{BotError, Result};

pub use openai::OpenAiClient;
pub use pinecone::PineconeIndex;
pub use retry::RetryPolicy;

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// One ranked hit from the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Text → vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Nearest-neighbour search over stored reference passages
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-k matches, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;

    /// Metadata for a stored vector, `None` when the id is unknown
    async fn fetch_metadata(&self, id: &str) -> Result<Option<Map<String, Value>>>;
}

/// Role-tagged messages → generated text
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Map a failed send, reporting an expired deadline as `BotError::Timeout`
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> BotError {
    if err.is_timeout() {
        BotError::Timeout { duration_ms: timeout.as_millis() as u64 }
    } else {
        BotError::Http(err)
    }
}

/// Turn a response into `T`, mapping non-success status to `BotError::Api`
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(BotError::api(service, status, body));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| BotError::invalid_response(service, e.to_string()))
}
