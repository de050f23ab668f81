//! Startup wiring: probe, snapshot, loops

use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::backend::GraphBackend;
use crate::config::AssistantConfig;
use crate::conversation::ConversationLoop;
use crate::correction::CorrectionLoop;
use crate::executor::{ExecutionResult, QueryExecutor};
use crate::nlq::client::CompletionService;
use crate::nlq::QueryTranslator;
use crate::output::OutputSink;
use crate::render::OutputFormat;
use crate::schema::{SchemaError, SchemaSnapshot};

#[derive(Error, Debug)]
pub enum StartupError {
    /// The connectivity probe failed
    #[error("Neo4j Server not running or not available: {0}")]
    Unavailable(String),

    /// The schema snapshot could not be captured
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A connected assistant, ready to take queries
pub struct Assistant {
    correction: CorrectionLoop,
    snapshot: Arc<SchemaSnapshot>,
    max_clarification_rounds: Option<u32>,
}

impl Assistant {
    /// Probe the database, capture the schema snapshot and wire the loops
    pub async fn start(
        config: &AssistantConfig,
        backend: Arc<dyn GraphBackend>,
        service: Arc<dyn CompletionService>,
        format: OutputFormat,
    ) -> Result<Self, StartupError> {
        let executor = QueryExecutor::new(backend);

        if let ExecutionResult::Failure { error_message } = executor.probe().await {
            return Err(StartupError::Unavailable(error_message));
        }
        info!("Neo4j is reachable");

        let snapshot = Arc::new(SchemaSnapshot::capture(executor.backend()).await?);
        let translator = QueryTranslator::new(service, snapshot.clone(), config.max_tokens);

        Ok(Self {
            correction: CorrectionLoop::new(translator, executor, format),
            snapshot,
            max_clarification_rounds: config.max_clarification_rounds,
        })
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    /// Hand the assistant over to an interactive loop reading `input`
    pub fn into_conversation<R: BufRead>(self, input: R, sink: OutputSink) -> ConversationLoop<R> {
        ConversationLoop::new(input, self.correction, sink)
            .with_max_clarification_rounds(self.max_clarification_rounds)
    }
}
