//! Configuration management for PensionBot
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.pensionbot/config.toml
//!
//! API keys never live in the file. Each service section names the
//! environment variable its key is read from, and `.env` files are
//! honoured through `dotenv` at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::errors::{BotError, Result};

/// System instruction sent to models that accept one
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are an expert assistant helping actuaries create Defined Benefit Pension Plans.";

/// Complete configuration for PensionBot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub pinecone: PineconeConfig,
    pub retrieval: RetrievalConfig,
    pub retry: RetryConfig,
    pub chat: ChatConfig,
    pub paths: PathsConfig,
}

/// OpenAI-compatible embedding and chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub embedding_model: String,
    /// Applies to embeddings and the health check
    pub timeout_secs: u64,
    /// Reasoning models can take minutes to answer
    pub completion_timeout_secs: u64,
}

/// Pinecone index data plane
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// Index host, e.g. https://carmen-abc123.svc.us-east-1.pinecone.io
    pub index_host: Option<String>,
    pub index_host_env: String,
    pub api_key_env: String,
    pub namespace: Option<String>,
    /// Metadata field holding the passage text
    pub text_field: String,
    /// Ask the query endpoint for metadata instead of a follow-up fetch
    pub include_metadata: bool,
    pub timeout_secs: u64,
}

/// Retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

/// Retry policy for transient service failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Chat lanes and prompting policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Models offered as lanes, in display order
    pub models: Vec<String>,
    pub default_model: String,
    pub system_instruction: String,
    /// Model name prefixes that reject a system message
    pub no_system_prefixes: Vec<String>,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            pinecone: PineconeConfig::default(),
            retrieval: RetrievalConfig::default(),
            retry: RetryConfig::default(),
            chat: ChatConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
            timeout_secs: 60,
            completion_timeout_secs: 300,
        }
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            index_host: None,
            index_host_env: "PINECONE_INDEX_HOST".to_string(),
            api_key_env: "PINECONE_API_KEY".to_string(),
            namespace: None,
            text_field: "text".to_string(),
            include_metadata: false,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            models: vec!["gpt-4o".to_string(), "o1-preview".to_string()],
            default_model: "gpt-4o".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            no_system_prefixes: vec!["o1".to_string()],
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.pensionbot".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| BotError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".pensionbot").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(BotError::Config(
                "retrieval.top_k must be greater than 0".to_string()
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(BotError::Config(
                "retry.max_attempts must be at least 1".to_string()
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(BotError::Config(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string()
            ));
        }

        if self.chat.models.is_empty() {
            return Err(BotError::Config(
                "chat.models must list at least one model".to_string()
            ));
        }

        if !self.chat.models.contains(&self.chat.default_model) {
            return Err(BotError::Config(format!(
                "chat.default_model '{}' is not listed in chat.models",
                self.chat.default_model
            )));
        }

        if self.openai.timeout_secs == 0 || self.openai.completion_timeout_secs == 0 {
            return Err(BotError::Config(
                "openai timeouts must be greater than 0".to_string()
            ));
        }

        if self.pinecone.text_field.trim().is_empty() {
            return Err(BotError::Config(
                "pinecone.text_field must not be empty".to_string()
            ));
        }

        Ok(())
    }

    /// Read the OpenAI key from its configured environment variable
    pub fn openai_api_key(&self) -> Result<String> {
        read_env(&self.openai.api_key_env)
    }

    /// Read the Pinecone key from its configured environment variable
    pub fn pinecone_api_key(&self) -> Result<String> {
        read_env(&self.pinecone.api_key_env)
    }

    /// Index host from the file, falling back to the environment
    pub fn pinecone_index_host(&self) -> Result<String> {
        match &self.pinecone.index_host {
            Some(host) if !host.trim().is_empty() => Ok(host.trim_end_matches('/').to_string()),
            _ => read_env(&self.pinecone.index_host_env)
                .map(|h| h.trim_end_matches('/').to_string())
                .map_err(|_| BotError::Config(format!(
                    "Pinecone index host not configured (set pinecone.index_host or {})",
                    self.pinecone.index_host_env
                ))),
        }
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    /// REPL input history file
    pub fn history_file(&self) -> PathBuf {
        self.state_dir().join("history")
    }
}

fn read_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BotError::MissingApiKey(name.to_string())),
    }
}

/// Mask a secret for display, keeping the last four characters
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
