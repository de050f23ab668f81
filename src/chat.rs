//! Plain chat mode: every line goes straight to the completion service

use std::io::BufRead;
use std::sync::Arc;

use crate::conversation::is_exit;
use crate::nlq::client::{CompletionRequest, CompletionService};
use crate::output::OutputSink;

pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const CHAT_PROMPT: &str = "\nYour question: ";

pub struct ChatLoop<R> {
    input: R,
    service: Arc<dyn CompletionService>,
    sink: OutputSink,
    max_tokens: u32,
}

impl<R: BufRead> ChatLoop<R> {
    pub fn new(input: R, service: Arc<dyn CompletionService>, sink: OutputSink, max_tokens: u32) -> Self {
        Self {
            input,
            service,
            sink,
            max_tokens,
        }
    }

    pub async fn run(&mut self) -> std::io::Result<()> {
        self.sink
            .log("Welcome! Ask your questions. Type 'exit' to end the program.");

        loop {
            self.sink.prompt(CHAT_PROMPT);
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit(question) {
                self.sink.log("Goodbye!");
                break;
            }

            let request = CompletionRequest {
                system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
                prompt: question.to_string(),
                temperature: None,
                max_tokens: self.max_tokens,
            };
            match self.service.complete(&request).await {
                Ok(answer) => self.sink.log(&format!("\nAnswer: {}", answer)),
                Err(e) => self.sink.log(&format!("An error occurred: {}", e)),
            }
        }
        Ok(())
    }
}
