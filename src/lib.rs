//! PensionBot - plain vs retrieval-augmented chat on Defined Benefit Pension Plans
//!
//! A question goes to a chat model either as typed (plain lanes) or spliced
//! together with the closest passage from a Pinecone index (augmented
//! lanes), so the two answers can be compared side by side.
//!
//! # Architecture
//!
//! - **providers**: OpenAI embeddings and completions, Pinecone queries, retry
//! - **rag**: query normalisation, reference retrieval, prompt augmentation
//! - **chat**: lanes, histories, the turn engine
//! - **repl** / **cli** / **doctor**: terminal surfaces

pub mod errors;
pub mod config;
pub mod logging;
pub mod cli;
pub mod providers;
pub mod rag;
pub mod chat;
pub mod repl;
pub mod doctor;

// Re-export commonly used types
pub use chat::{ChatEngine, ChatMode, LaneKey, SessionManager, TurnOutcome};
pub use config::Config;
pub use errors::{BotError, Result};
pub use rag::{RAGPipeline, RAGResult};
