//! Interactive front end
//!
//! Reads one line at a time, hands each query to the correction loop and
//! runs the clarification sub-dialog. A bad turn is reported and the loop
//! moves on to the next line.

use std::io::BufRead;

use tracing::{debug, info};

use crate::correction::{CorrectionLoop, TurnOutcome};
use crate::output::OutputSink;

pub const EXIT_SENTINEL: &str = "exit";
pub const QUERY_PROMPT: &str = "Enter your query (or 'exit' to quit): ";
pub const CLARIFICATION_PROMPT: &str = "Please provide more information: ";

/// Exact, case-insensitive match on the exit sentinel
pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_SENTINEL)
}

pub struct ConversationLoop<R> {
    input: R,
    correction: CorrectionLoop,
    sink: OutputSink,
    max_clarification_rounds: Option<u32>,
}

impl<R: BufRead> ConversationLoop<R> {
    pub fn new(input: R, correction: CorrectionLoop, sink: OutputSink) -> Self {
        Self {
            input,
            correction,
            sink,
            max_clarification_rounds: None,
        }
    }

    /// Bound the number of clarification answers accepted per query
    pub fn with_max_clarification_rounds(mut self, max: Option<u32>) -> Self {
        self.max_clarification_rounds = max;
        self
    }

    /// Run until the exit sentinel or end of input.
    ///
    /// Only a failure to read input ends the loop with an error.
    pub async fn run(&mut self) -> std::io::Result<()> {
        loop {
            self.sink.prompt(QUERY_PROMPT);
            let Some(line) = self.read_line()? else {
                debug!("End of input");
                break;
            };

            let query = line.trim();
            if is_exit(query) {
                info!("Exit requested");
                break;
            }

            self.handle_query(query.to_string()).await?;
        }
        Ok(())
    }

    async fn handle_query(&mut self, mut query: String) -> std::io::Result<()> {
        let mut rounds: u32 = 0;
        loop {
            match self.correction.run(&query, &mut self.sink).await {
                Ok(TurnOutcome::Done(resolution)) => {
                    debug!("Turn finished: {:?}", resolution);
                    return Ok(());
                }
                Ok(TurnOutcome::Clarify { question }) => {
                    self.sink.log(&format!("Clarification needed: {}", question));

                    if self.max_clarification_rounds.is_some_and(|max| rounds >= max) {
                        self.sink
                            .log("Clarification limit reached; please rephrase your query.");
                        return Ok(());
                    }
                    rounds += 1;

                    self.sink.prompt(CLARIFICATION_PROMPT);
                    let Some(answer) = self.read_line()? else {
                        return Ok(());
                    };
                    query = format!("{} {}", query, answer.trim());
                }
                Err(e) => {
                    self.sink.log(&format!("Translation failed: {}", e));
                    return Ok(());
                }
            }
        }
    }

    /// Next line without its terminator, or None at end of input
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }
}
