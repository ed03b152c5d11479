//! OpenAI-compatible API client
//!
//! Covers the two endpoints the chat tool needs:
//! - POST /embeddings        (query embedding)
//! - POST /chat/completions  (assistant reply)
//!
//! Authentication is a bearer token. Requests are wrapped in the
//! configured `RetryPolicy`. Completions get their own, longer deadline and
//! are not resent after it expires.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{BotError, Result};
use crate::providers::{
    read_json, transport_error, ChatCompletion, ChatMessage, Embedder, RetryPolicy,
};

const SERVICE: &str = "openai";

/// OpenAI HTTP client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    timeout: Duration,
    completion_timeout: Duration,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Build from configuration, reading the key from the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.openai_api_key()?;
        let client = Self::new(
            &config.openai.base_url,
            &api_key,
            &config.openai.embedding_model,
            Duration::from_secs(config.openai.timeout_secs),
            RetryPolicy::from_config(&config.retry),
        )?;
        Ok(client.with_completion_timeout(Duration::from_secs(
            config.openai.completion_timeout_secs,
        )))
    }

    /// Create client with explicit settings
    pub fn new(
        base_url: &str,
        api_key: &str,
        embedding_model: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BotError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            embedding_model: embedding_model.to_string(),
            timeout,
            completion_timeout: timeout,
            retry,
        })
    }

    /// Deadline for /chat/completions, separate from the client timeout
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Check the API answers and accepts the key (GET /models)
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(BotError::api(SERVICE, status, body))
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn completion_timeout(&self) -> Duration {
        self.completion_timeout
    }

    async fn post_embedding(&self, request: &EmbeddingRequest<'_>) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let parsed: EmbeddingResponse = read_json(SERVICE, response).await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BotError::invalid_response(SERVICE, "embedding response had no vectors"))
    }

    async fn post_completion(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.completion_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.completion_timeout))?;

        let parsed: CompletionResponse = read_json(SERVICE, response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BotError::invalid_response(SERVICE, "completion response had no content"))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: vec![text],
        };
        tracing::debug!(model = %self.embedding_model, chars = text.len(), "requesting embedding");
        self.retry
            .run("embedding", || self.post_embedding(&request))
            .await
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest { model, messages };
        tracing::debug!(model, messages = messages.len(), "requesting completion");
        self.retry
            .run_when(
                "chat completion",
                |e| e.is_transient() && !e.is_timeout(),
                || self.post_completion(&request),
            )
            .await
    }
}

/// POST /embeddings body
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// POST /chat/completions body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}
