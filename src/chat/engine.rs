//! Chat engine: one turn for one lane
//!
//! Plain lanes send the query as-is. Augmented lanes run it through the
//! RAG pipeline first. Both apply the model's system-message policy and
//! trim the reply.

use std::sync::Arc;
use std::time::Instant;

use crate::chat::mode::{ChatMode, LaneKey, ModelProfile};
use crate::chat::session::SessionManager;
use crate::config::{ChatConfig, Config};
use crate::errors::{BotError, Result};
use crate::providers::{
    ChatCompletion, ChatMessage, Embedder, OpenAiClient, PineconeIndex, VectorIndex,
};
use crate::rag::{RAGPipeline, RetrievedReference, SearchParams};

/// What a turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub lane: LaneKey,
    /// Trimmed assistant reply
    pub reply: String,
    /// User-message content actually sent to the model
    pub prompt_sent: String,
    /// Best match for augmented lanes
    pub reference: Option<RetrievedReference>,
    pub duration_ms: u64,
}

/// Plain and augmented answers to the same question
#[derive(Debug)]
pub struct Comparison {
    pub plain: Result<TurnOutcome>,
    pub augmented: Result<TurnOutcome>,
}

/// Drives completions for every lane
pub struct ChatEngine {
    completion: Arc<dyn ChatCompletion>,
    pipeline: std::result::Result<RAGPipeline, String>,
    config: ChatConfig,
}

impl ChatEngine {
    /// Engine with retrieval available
    pub fn new(
        completion: Arc<dyn ChatCompletion>,
        pipeline: RAGPipeline,
        config: ChatConfig,
    ) -> Self {
        Self { completion, pipeline: Ok(pipeline), config }
    }

    /// Engine that can only serve plain lanes
    pub fn plain_only(
        completion: Arc<dyn ChatCompletion>,
        config: ChatConfig,
        reason: impl Into<String>,
    ) -> Self {
        Self { completion, pipeline: Err(reason.into()), config }
    }

    /// Wire the OpenAI and Pinecone clients from configuration.
    ///
    /// A missing OpenAI key is fatal. A Pinecone problem only disables
    /// augmented lanes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::from_config(config)?);

        match PineconeIndex::from_config(config) {
            Ok(index) => {
                let embedder: Arc<dyn Embedder> = openai.clone();
                let index: Arc<dyn VectorIndex> = Arc::new(index);
                let params = SearchParams {
                    top_k: config.retrieval.top_k,
                    text_field: config.pinecone.text_field.clone(),
                };
                let pipeline = RAGPipeline::with_params(embedder, index, params);
                Ok(Self::new(openai, pipeline, config.chat.clone()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "vector index unavailable, augmented lanes disabled");
                Ok(Self::plain_only(openai, config.chat.clone(), e.to_string()))
            }
        }
    }

    /// Whether augmented lanes can be served
    pub fn retrieval_available(&self) -> bool {
        self.pipeline.is_ok()
    }

    /// Why augmented lanes are off, if they are
    pub fn retrieval_unavailable_reason(&self) -> Option<&str> {
        self.pipeline.as_ref().err().map(String::as_str)
    }

    pub fn profile(&self, model: &str) -> ModelProfile {
        ModelProfile::resolve(model, &self.config)
    }

    /// Messages for one request: optional system instruction, then the prompt
    pub fn build_messages(profile: &ModelProfile, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(instruction) = &profile.system_instruction {
            messages.push(ChatMessage::system(instruction.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    /// Answer `query` on `lane` without touching any history
    pub async fn respond(&self, lane: &LaneKey, query: &str) -> Result<TurnOutcome> {
        let start = Instant::now();
        let profile = self.profile(&lane.model);

        let (prompt_sent, reference) = match lane.mode {
            ChatMode::Plain => (query.to_string(), None),
            ChatMode::Augmented => {
                let pipeline = self.pipeline.as_ref().map_err(|reason| {
                    BotError::Config(format!("augmented mode unavailable: {}", reason))
                })?;
                let result = pipeline.execute(query).await?;
                (result.augmented_prompt, result.reference)
            }
        };

        let messages = Self::build_messages(&profile, &prompt_sent);
        let raw = self.completion.complete(&profile.name, &messages).await?;
        let reply = raw.trim().to_string();

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(lane = %lane, duration_ms, reply_chars = reply.len(), "turn complete");

        Ok(TurnOutcome {
            lane: lane.clone(),
            reply,
            prompt_sent,
            reference,
            duration_ms,
        })
    }

    /// Run a turn and record it: the question first, the reply on success
    pub async fn run_turn(
        &self,
        session: &mut SessionManager,
        lane: &LaneKey,
        query: &str,
    ) -> Result<TurnOutcome> {
        session.record_user(lane, query);
        let outcome = self.respond(lane, query).await?;
        session.record_assistant(lane, &outcome.reply);
        Ok(outcome)
    }

    /// Ask `model` the same question in plain and augmented mode
    pub async fn compare(
        &self,
        session: &mut SessionManager,
        model: &str,
        query: &str,
    ) -> Comparison {
        let plain_key = LaneKey::new(ChatMode::Plain, model);
        let rag_key = LaneKey::new(ChatMode::Augmented, model);

        let plain = self.run_turn(session, &plain_key, query).await;
        let augmented = self.run_turn(session, &rag_key, query).await;
        Comparison { plain, augmented }
    }
}
