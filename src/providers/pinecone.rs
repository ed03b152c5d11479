//! Pinecone index data-plane client
//!
//! Endpoints used:
//! - POST /query                 (top-k nearest neighbours)
//! - GET  /vectors/fetch?ids=..  (metadata for one id)
//! - POST /describe_index_stats  (doctor check)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{BotError, Result};
use crate::providers::{read_json, transport_error, IndexMatch, RetryPolicy, VectorIndex};

const SERVICE: &str = "pinecone";

/// Pinecone index client bound to one index host
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    include_metadata: bool,
    timeout: Duration,
    retry: RetryPolicy,
}

/// Summary returned by describe_index_stats
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub total_vector_count: u64,
}

impl PineconeIndex {
    /// Build from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.pinecone_api_key()?;
        let host = config.pinecone_index_host()?;
        let index = Self::new(
            &host,
            &api_key,
            Duration::from_secs(config.pinecone.timeout_secs),
            RetryPolicy::from_config(&config.retry),
        )?;
        Ok(index
            .with_namespace(config.pinecone.namespace.clone())
            .with_metadata(config.pinecone.include_metadata))
    }

    /// Create client with explicit settings
    pub fn new(host: &str, api_key: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BotError::Http)?;

        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Ok(Self {
            client,
            host,
            api_key: api_key.to_string(),
            namespace: None,
            include_metadata: false,
            timeout,
            retry,
        })
    }

    /// Set namespace used for query and fetch
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Ask the query endpoint to return metadata alongside matches
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Index statistics, used as a reachability probe
    pub async fn describe_stats(&self) -> Result<IndexStats> {
        let url = format!("{}/describe_index_stats", self.host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        read_json(SERVICE, response).await
    }

    async fn post_query(&self, request: &QueryRequest<'_>) -> Result<Vec<IndexMatch>> {
        let url = format!("{}/query", self.host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let parsed: QueryResponse = read_json(SERVICE, response).await?;
        Ok(parsed.matches)
    }

    async fn get_fetch(&self, id: &str) -> Result<Option<Map<String, Value>>> {
        let url = format!("{}/vectors/fetch", self.host);
        let mut params: Vec<(&str, &str)> = vec![("ids", id)];
        if let Some(ns) = &self.namespace {
            params.push(("namespace", ns.as_str()));
        }

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let mut parsed: FetchResponse = read_json(SERVICE, response).await?;
        Ok(parsed.vectors.remove(id).and_then(|v| v.metadata))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: self.include_metadata,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let matches = self
            .retry
            .run("index query", || self.post_query(&request))
            .await?;
        tracing::debug!(top_k, returned = matches.len(), "index query complete");
        Ok(matches)
    }

    async fn fetch_metadata(&self, id: &str) -> Result<Option<Map<String, Value>>> {
        self.retry.run("index fetch", || self.get_fetch(id)).await
    }
}

/// POST /query body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Debug, Deserialize)]
struct FetchedVector {
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}
