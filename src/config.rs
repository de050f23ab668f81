//! Assistant configuration
//!
//! Values are resolved with a fixed precedence:
//! explicit CLI flag > config file > environment > built-in default.
//! No credential has a built-in default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_NEO4J_USER: &str = "neo4j";
pub const DEFAULT_NEO4J_DATABASE: &str = "neo4j";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_CHAT_MAX_TOKENS: u32 = 15000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const NEO4J_PASSWORD_VAR: &str = "NEO4J_PASSWORD";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the recognized keys
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// LLM provider options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LLMProvider {
    #[default]
    OpenAI,
    Ollama,
    Gemini,
}

/// Contents of the optional JSON config file.
///
/// Every key is optional and unrecognized keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
    pub neo4j_database: Option<String>,
    pub openai_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub chat_max_tokens: Option<u32>,
    pub timeout: Option<u64>,
    pub llm_provider: Option<LLMProvider>,
    pub api_base_url: Option<String>,
    pub max_clarification_rounds: Option<u32>,
}

impl FileConfig {
    /// Load a config file from disk
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let shown = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: shown.clone(),
            source,
        })?;
        debug!("Loaded config file {}", shown);
        Ok(config)
    }

    /// Parse config file contents
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Values taken from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub openai_api_key: Option<String>,
    pub neo4j_password: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            openai_api_key: read(OPENAI_API_KEY_VAR),
            neo4j_password: read(NEO4J_PASSWORD_VAR),
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub timeout: Option<u64>,
    pub max_clarification_rounds: Option<u32>,
}

/// Fully resolved configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Bolt URI of the Neo4j server
    pub neo4j_uri: String,
    /// Database user
    pub neo4j_user: String,
    /// Database password, if any was configured
    #[serde(skip_serializing)]
    pub neo4j_password: Option<String>,
    /// Database name
    pub neo4j_database: String,
    /// The LLM provider to use
    pub provider: LLMProvider,
    /// Model name (e.g., "gpt-4o-mini", "llama3")
    pub model: String,
    /// API key for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (provider default when None)
    pub api_base_url: Option<String>,
    /// Output-token budget for each translation
    pub max_tokens: u32,
    /// Output-token budget for each chat-mode answer
    pub chat_max_tokens: u32,
    /// Database connection and statement timeout in seconds
    pub timeout: u64,
    /// Maximum clarification rounds per query (unbounded when None)
    pub max_clarification_rounds: Option<u32>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            neo4j_uri: DEFAULT_NEO4J_URI.to_string(),
            neo4j_user: DEFAULT_NEO4J_USER.to_string(),
            neo4j_password: None,
            neo4j_database: DEFAULT_NEO4J_DATABASE.to_string(),
            provider: LLMProvider::default(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_key: None,
            api_base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            chat_max_tokens: DEFAULT_CHAT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT_SECS,
            max_clarification_rounds: None,
        }
    }
}

impl AssistantConfig {
    /// Merge the three configuration layers over the built-in defaults
    pub fn resolve(file: FileConfig, env: EnvConfig, cli: CliOverrides) -> Self {
        let defaults = Self::default();

        let neo4j_password = file.neo4j_password.or(env.neo4j_password);
        if neo4j_password.is_none() {
            warn!(
                "No Neo4j password configured (config file or ${}); connecting with an empty password",
                NEO4J_PASSWORD_VAR
            );
        }

        Self {
            neo4j_uri: file.neo4j_uri.unwrap_or(defaults.neo4j_uri),
            neo4j_user: file.neo4j_user.unwrap_or(defaults.neo4j_user),
            neo4j_password,
            neo4j_database: file.neo4j_database.unwrap_or(defaults.neo4j_database),
            provider: file.llm_provider.unwrap_or(defaults.provider),
            model: file.openai_model.unwrap_or(defaults.model),
            api_key: cli.api_key.or(env.openai_api_key),
            api_base_url: file.api_base_url,
            max_tokens: file.max_tokens.unwrap_or(defaults.max_tokens),
            chat_max_tokens: file.chat_max_tokens.unwrap_or(defaults.chat_max_tokens),
            timeout: cli.timeout.or(file.timeout).unwrap_or(defaults.timeout),
            max_clarification_rounds: cli
                .max_clarification_rounds
                .or(file.max_clarification_rounds),
        }
    }
}
