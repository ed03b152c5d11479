// End-to-end augmentation: normalize -> retrieve -> splice
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::Result;
use crate::providers::{Embedder, VectorIndex};
use crate::rag::context::{augment_prompt, normalize_query};
use crate::rag::retrieval::{RetrievalEngine, RetrievedReference, SearchParams};

/// Augmentation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    /// Original query
    pub query: String,
    /// Text that was embedded
    pub normalized: String,
    /// Query with the reference spliced on
    pub augmented_prompt: String,
    /// Best match, `None` when the index was empty for this query
    pub reference: Option<RetrievedReference>,
    pub duration_ms: u64,
}

impl RAGResult {
    /// Passage text that went into the prompt (empty on fallback)
    pub fn reference_text(&self) -> &str {
        self.reference.as_ref().map(|r| r.text.as_str()).unwrap_or("")
    }
}

/// Retrieval-augmentation pipeline
pub struct RAGPipeline {
    retrieval_engine: RetrievalEngine,
}

impl RAGPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            retrieval_engine: RetrievalEngine::new(embedder, index),
        }
    }

    pub fn with_params(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        params: SearchParams,
    ) -> Self {
        Self {
            retrieval_engine: RetrievalEngine::with_params(embedder, index, params),
        }
    }

    /// Build the augmented prompt for `query`.
    ///
    /// Service failures propagate. An empty index result is not a failure:
    /// the reference segment is left empty.
    pub async fn execute(&self, query: &str) -> Result<RAGResult> {
        let start = Instant::now();
        let normalized = normalize_query(query);

        let reference = self.retrieval_engine.retrieve(&normalized).await?;
        let reference_text = reference.as_ref().map(|r| r.text.as_str()).unwrap_or("");
        let augmented_prompt = augment_prompt(query, reference_text);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            reference_id = reference.as_ref().map(|r| r.id.as_str()).unwrap_or("-"),
            reference_chars = reference_text.len(),
            duration_ms,
            "prompt augmented"
        );

        Ok(RAGResult {
            query: query.to_string(),
            normalized,
            augmented_prompt,
            reference,
            duration_ms,
        })
    }

    /// Execute and return only the augmented prompt
    pub async fn augment(&self, query: &str) -> Result<String> {
        Ok(self.execute(query).await?.augmented_prompt)
    }

    pub fn params(&self) -> &SearchParams {
        self.retrieval_engine.params()
    }
}
