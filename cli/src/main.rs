//! Neo4j Assistant CLI — natural-language queries against a Neo4j database
//!
//! Connects to Neo4j over Bolt, captures the schema, and starts an
//! interactive session backed by the configured LLM provider.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use neo4j_assistant::chat::ChatLoop;
use neo4j_assistant::{
    Assistant, AssistantConfig, CliOverrides, EnvConfig, FileConfig, LlmClient, Neo4jBackend,
    OutputFormat, OutputSink, StartupError,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "neo4j-assistant", version, about = "Neo4j Assistant")]
struct Cli {
    /// Suppress console output
    #[arg(short, long)]
    quiet: bool,

    /// OpenAI API key (default: $OPENAI_API_KEY)
    #[arg(short, long)]
    key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output file for logs and data
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timeout for database connection and queries in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Result format
    #[arg(long, default_value = "json")]
    format: FormatArg,

    /// Maximum clarification rounds per query
    #[arg(long)]
    max_clarifications: Option<u32>,

    /// Plain chat with the model, without a database
    #[arg(long)]
    chat: bool,
}

#[derive(Clone, clap::ValueEnum)]
enum FormatArg {
    Json,
    Table,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::INFO } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = AssistantConfig::resolve(
        file,
        EnvConfig::from_env(),
        CliOverrides {
            api_key: cli.key.clone(),
            timeout: cli.timeout,
            max_clarification_rounds: cli.max_clarifications,
        },
    );

    let service = Arc::new(LlmClient::new(&config)?);
    let sink = OutputSink::new(cli.quiet, cli.output.clone());
    let stdin = std::io::stdin().lock();

    if cli.chat {
        ChatLoop::new(stdin, service, sink, config.chat_max_tokens)
            .run()
            .await
            .context("Reading input failed")?;
        return Ok(());
    }

    let backend = Arc::new(
        Neo4jBackend::connect(&config)
            .await
            .context("Failed to connect to Neo4j")?,
    );

    let assistant = match Assistant::start(&config, backend, service, cli.format.into()).await {
        Ok(assistant) => assistant,
        Err(StartupError::Unavailable(reason)) => {
            tracing::warn!("Connectivity probe failed: {}", reason);
            println!("Neo4j Server not running or not available.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    assistant
        .into_conversation(stdin, sink)
        .run()
        .await
        .context("Reading input failed")?;
    Ok(())
}
