//! Neo4j Assistant
//!
//! Translates natural-language questions into Cypher for a Neo4j database,
//! runs them, and corrects a failing statement once by feeding the database
//! error back to the language model.
//!
//! # Architecture
//!
//! - [`conversation::ConversationLoop`] reads queries and runs the
//!   clarification sub-dialog.
//! - [`correction::CorrectionLoop`] drives translate → execute → correct,
//!   with at most one correction per query.
//! - [`nlq::QueryTranslator`] builds schema-grounded prompts and parses the
//!   model's JSON reply.
//! - [`executor::QueryExecutor`] turns every database outcome into an
//!   [`executor::ExecutionResult`].
//! - [`schema::SchemaSnapshot`] is captured once at startup and shared
//!   read-only.
//!
//! The language model and the database sit behind the
//! [`nlq::client::CompletionService`] and [`backend::GraphBackend`] traits.

#![warn(clippy::all)]

pub mod backend;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod correction;
pub mod executor;
pub mod nlq;
pub mod output;
pub mod render;
pub mod schema;
pub mod session;

pub use backend::{GraphBackend, GraphError, GraphResult, Neo4jBackend, Record};
pub use config::{AssistantConfig, CliOverrides, ConfigError, EnvConfig, FileConfig, LLMProvider};
pub use conversation::ConversationLoop;
pub use correction::{CorrectionLoop, Resolution, TurnOutcome};
pub use executor::{ExecutionResult, QueryExecutor};
pub use nlq::client::{CompletionRequest, CompletionService, LlmClient};
pub use nlq::{FailedAttempt, NLQError, NLQResult, QueryTranslator, TranslationResponse};
pub use output::OutputSink;
pub use render::OutputFormat;
pub use schema::{SchemaError, SchemaSnapshot};
pub use session::{Assistant, StartupError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
