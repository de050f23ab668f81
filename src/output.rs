//! User-facing output
//!
//! Every message goes to the console (unless quiet) and to an optional
//! append-only log file. Both are best effort: a failed log write disables
//! the file and the session carries on console-only.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

pub type Writer = Box<dyn Write + Send>;

pub struct OutputSink {
    console: Option<Writer>,
    prompts: Writer,
    log_path: Option<PathBuf>,
}

impl OutputSink {
    /// Console on stdout unless `quiet`, plus the optional log file
    pub fn new(quiet: bool, log_path: Option<PathBuf>) -> Self {
        let console: Option<Writer> = if quiet {
            None
        } else {
            Some(Box::new(std::io::stdout()))
        };
        Self {
            console,
            prompts: Box::new(std::io::stdout()),
            log_path,
        }
    }

    /// Sink with explicit writers for messages and prompts
    pub fn with_writers(console: Option<Writer>, prompts: Writer, log_path: Option<PathBuf>) -> Self {
        Self {
            console,
            prompts,
            log_path,
        }
    }

    /// Emit one message to every active sink
    pub fn log(&mut self, message: &str) {
        if let Some(console) = self.console.as_mut() {
            let _ = writeln!(console, "{}", message);
            let _ = console.flush();
        }

        if let Some(path) = self.log_path.as_deref() {
            if let Err(e) = append_line(path, message) {
                warn!(
                    "Cannot write log file {}: {}; continuing with console output only",
                    path.display(),
                    e
                );
                self.log_path = None;
            }
        }
    }

    /// Show an input prompt. Prompts are never logged and ignore quiet mode.
    pub fn prompt(&mut self, text: &str) {
        let _ = write!(self.prompts, "{}", text);
        let _ = self.prompts.flush();
    }

    /// Log file still in use, if any
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}

fn append_line(path: &Path, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", message)
}
