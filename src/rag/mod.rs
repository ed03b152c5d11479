// Retrieval-Augmented Generation pipeline
//
// Components:
// - Context: query normalization and prompt splicing
// - Retrieval: embed the query, take the index's best match
// - Pipeline: normalize -> retrieve -> splice, with empty-result fallback

pub mod context;
pub mod pipeline;
pub mod retrieval;

// Re-export key types
pub use context::{augment_prompt, normalize_query, REFERENCE_SEPARATOR};
pub use pipeline::{RAGPipeline, RAGResult};
pub use retrieval::{RetrievalEngine, RetrievedReference, SearchParams};
