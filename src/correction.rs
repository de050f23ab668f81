//! Translate → execute → correct
//!
//! One turn runs at most two statements: the generated one and, if that
//! fails, a single corrected one. A second failure is reported, never
//! retried.

use tracing::info;

use crate::backend::Record;
use crate::executor::{ExecutionResult, QueryExecutor};
use crate::nlq::{no_statement_error, FailedAttempt, NLQResult, QueryTranslator, TranslationResponse};
use crate::output::OutputSink;
use crate::render::{render_rows, OutputFormat};

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The translator needs more input; nothing was executed
    Clarify { question: String },
    /// The turn reached its terminal state
    Done(Resolution),
}

/// Terminal states of a turn that produced a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The generated statement succeeded
    Executed { cypher: String, rows: Vec<Record> },
    /// The generated statement failed and its correction succeeded
    Corrected { cypher: String, rows: Vec<Record> },
    /// The correction failed as well
    CorrectionFailed { cypher: String, error_message: String },
    /// The correction pass yielded no statement
    NoCorrectedQuery { error_message: String },
}

pub struct CorrectionLoop {
    translator: QueryTranslator,
    executor: QueryExecutor,
    format: OutputFormat,
}

impl CorrectionLoop {
    pub fn new(translator: QueryTranslator, executor: QueryExecutor, format: OutputFormat) -> Self {
        Self {
            translator,
            executor,
            format,
        }
    }

    /// Run one turn for `query`.
    ///
    /// A malformed translation, initial or corrective, is returned as an
    /// error and nothing further is executed. A well-formed correction that
    /// carries no statement ends the turn as `NoCorrectedQuery`.
    pub async fn run(&self, query: &str, sink: &mut OutputSink) -> NLQResult<TurnOutcome> {
        let (cypher, explanation) = match self.translator.translate(query, None).await? {
            TranslationResponse::Clarification { question } => {
                return Ok(TurnOutcome::Clarify { question });
            }
            TranslationResponse::Generated { cypher, explanation } => (cypher, explanation),
            TranslationResponse::NoStatement { .. } => return Err(no_statement_error()),
        };

        sink.log(&format!("Generated Cypher: {}", cypher));
        sink.log(&format!("Explanation: {}", explanation));

        let error_message = match self.executor.execute(&cypher).await {
            ExecutionResult::Success { rows } => {
                sink.log("Query executed successfully.");
                self.log_rows(&rows, sink);
                return Ok(TurnOutcome::Done(Resolution::Executed { cypher, rows }));
            }
            ExecutionResult::Failure { error_message } => error_message,
        };

        sink.log(&format!("Error executing query: {}", error_message));
        info!("Requesting a correction for the failed statement");

        let failed = FailedAttempt {
            cypher,
            error_message,
        };
        let corrected = match self.translator.translate(query, Some(&failed)).await? {
            TranslationResponse::Generated { cypher, .. } => cypher,
            TranslationResponse::Clarification { .. } | TranslationResponse::NoStatement { .. } => {
                sink.log("No corrected query produced.");
                return Ok(TurnOutcome::Done(Resolution::NoCorrectedQuery {
                    error_message: failed.error_message,
                }));
            }
        };

        sink.log(&format!("Corrected Cypher: {}", corrected));
        let resolution = match self.executor.execute(&corrected).await {
            ExecutionResult::Success { rows } => {
                sink.log("Corrected query executed successfully.");
                self.log_rows(&rows, sink);
                Resolution::Corrected {
                    cypher: corrected,
                    rows,
                }
            }
            ExecutionResult::Failure { error_message } => {
                sink.log(&format!("Error executing corrected query: {}", error_message));
                Resolution::CorrectionFailed {
                    cypher: corrected,
                    error_message,
                }
            }
        };
        Ok(TurnOutcome::Done(resolution))
    }

    fn log_rows(&self, rows: &[Record], sink: &mut OutputSink) {
        sink.log(&format!("Result: {}", render_rows(rows, self.format)));
    }
}
