//! Natural Language Querying (NLQ)
//!
//! Implements schema-grounded Text-to-Cypher translation using LLMs.

pub mod client;
pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schema::SchemaSnapshot;
use client::{CompletionRequest, CompletionService};

/// Fixed sampling temperature for translation calls
pub const TRANSLATION_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum NLQError {
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Malformed translation: {0}")]
    MalformedTranslation(String),
}

pub type NLQResult<T> = Result<T, NLQError>;

/// A statement that failed, fed back into the correction prompt
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub cypher: String,
    pub error_message: String,
}

/// Input of one translation attempt
#[derive(Debug, Clone)]
pub struct TranslationRequest<'a> {
    pub natural_language_query: &'a str,
    pub schema_context: &'a SchemaSnapshot,
    pub prior_error: Option<&'a FailedAttempt>,
}

/// What the translator produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TranslationResponse {
    /// More input is needed before a statement can be written
    Clarification { question: String },
    /// A statement ready to execute
    Generated { cypher: String, explanation: String },
    /// A well-formed reply that carries neither a question nor a statement.
    /// Only a correction pass accepts it; a first translation treats it as
    /// malformed.
    NoStatement { explanation: String },
}

/// Shape the model is asked to emit
#[derive(Deserialize)]
struct RawTranslation {
    #[serde(default)]
    clarification: Option<String>,
    #[serde(default)]
    cypher: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

impl TranslationResponse {
    /// Parse the raw completion text.
    ///
    /// A non-empty `clarification` wins over `cypher` when both are present.
    pub fn parse(raw: &str) -> NLQResult<Self> {
        let body = strip_code_fence(raw);
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| NLQError::MalformedTranslation(format!("not valid JSON ({}): {}", e, preview(raw))))?;
        if !value.is_object() {
            return Err(NLQError::MalformedTranslation(format!(
                "expected a JSON object: {}",
                preview(raw)
            )));
        }
        let parsed: RawTranslation = serde_json::from_value(value)
            .map_err(|e| NLQError::MalformedTranslation(e.to_string()))?;

        let non_empty = |field: Option<String>| field.filter(|s| !s.trim().is_empty());

        if let Some(question) = non_empty(parsed.clarification) {
            return Ok(TranslationResponse::Clarification { question });
        }
        let explanation = parsed.explanation.unwrap_or_default();
        match non_empty(parsed.cypher) {
            Some(cypher) => Ok(TranslationResponse::Generated { cypher, explanation }),
            None => Ok(TranslationResponse::NoStatement { explanation }),
        }
    }
}

/// Error for a first translation that yielded no statement
pub(crate) fn no_statement_error() -> NLQError {
    NLQError::MalformedTranslation(
        "response contains neither a clarification nor a cypher statement".to_string(),
    )
}

/// Strip one markdown code fence wrapping the whole response, if any.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if let Some(after_fence) = trimmed.strip_prefix("```") {
        if let Some(inner) = after_fence.strip_suffix("```") {
            // Skip a language tag such as "json\n"
            let code_start = inner.find('\n').map(|i| i + 1).unwrap_or(0);
            return inner[code_start..].trim();
        }
    }
    trimmed
}

fn preview(raw: &str) -> String {
    const MAX: usize = 120;
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Maps natural-language text to Cypher, grounded in a schema snapshot.
pub struct QueryTranslator {
    service: Arc<dyn CompletionService>,
    snapshot: Arc<SchemaSnapshot>,
    max_tokens: u32,
}

impl QueryTranslator {
    pub fn new(service: Arc<dyn CompletionService>, snapshot: Arc<SchemaSnapshot>, max_tokens: u32) -> Self {
        Self {
            service,
            snapshot,
            max_tokens,
        }
    }

    /// Translate `query`, or correct `prior_error` when one is supplied.
    ///
    /// `NoStatement` is only returned for a correction; on a first
    /// translation it is a `MalformedTranslation`.
    pub async fn translate(
        &self,
        query: &str,
        prior_error: Option<&FailedAttempt>,
    ) -> NLQResult<TranslationResponse> {
        let request = TranslationRequest {
            natural_language_query: query,
            schema_context: &self.snapshot,
            prior_error,
        };
        let completion = CompletionRequest {
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
            prompt: prompt::build(&request),
            temperature: Some(TRANSLATION_TEMPERATURE),
            max_tokens: self.max_tokens,
        };

        let raw = self.service.complete(&completion).await?;
        debug!("Raw translation response: {}", raw);
        match TranslationResponse::parse(&raw)? {
            TranslationResponse::NoStatement { .. } if prior_error.is_none() => Err(no_statement_error()),
            response => Ok(response),
        }
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }
}
