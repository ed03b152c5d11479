//! Reference retrieval: embed, search, pick the best passage
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::Result;
use crate::providers::{Embedder, IndexMatch, VectorIndex};

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of neighbours requested from the index
    pub top_k: usize,
    /// Metadata key holding the passage text
    pub text_field: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            text_field: "text".to_string(),
        }
    }
}

/// Best-ranked passage for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedReference {
    pub id: String,
    pub score: f32,
    pub text: String,
    /// Matches the index returned, rank 0 included
    pub candidates: usize,
}

/// Embeds a query and resolves its nearest stored passage
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    params: SearchParams,
}

impl RetrievalEngine {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self::with_params(embedder, index, SearchParams::default())
    }

    pub fn with_params(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        params: SearchParams,
    ) -> Self {
        Self { embedder, index, params }
    }

    /// Resolve the rank-0 passage for already-normalized text.
    ///
    /// `Ok(None)` when the index has no match. A match with no text in its
    /// metadata comes back with an empty `text`.
    pub async fn retrieve(&self, normalized: &str) -> Result<Option<RetrievedReference>> {
        let vector = self.embedder.embed(normalized).await?;
        let matches = self.index.query(&vector, self.params.top_k).await?;
        let candidates = matches.len();

        let Some(best) = matches.into_iter().next() else {
            tracing::info!("index returned no matches, continuing without reference");
            return Ok(None);
        };

        let text = self.resolve_text(&best).await?;
        if text.is_empty() {
            tracing::warn!(id = %best.id, field = %self.params.text_field, "best match has no passage text");
        }

        Ok(Some(RetrievedReference {
            id: best.id,
            score: best.score,
            text,
            candidates,
        }))
    }

    /// Passage text from inline metadata, else from a fetch by id
    async fn resolve_text(&self, best: &IndexMatch) -> Result<String> {
        if let Some(text) = best.metadata.as_ref().and_then(|m| self.text_of(m)) {
            return Ok(text);
        }

        let fetched = self.index.fetch_metadata(&best.id).await?;
        Ok(fetched.as_ref().and_then(|m| self.text_of(m)).unwrap_or_default())
    }

    fn text_of(&self, metadata: &Map<String, Value>) -> Option<String> {
        metadata
            .get(&self.params.text_field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }
}
