//! ComAI
//!
//! Main entry point for the `comai` tool: an HTTP front end for the
//! question-answering pipeline, plus a one-shot terminal client.

mod commands;
mod http;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use comai_core::config::{AppConfig, CliOverrides};
use comai_core::logging::{self, LogFormat};
use std::path::PathBuf;

/// ComAI - retrieval-grounded answers about Commedia Solutions
#[derive(Parser, Debug)]
#[command(name = "comai")]
#[command(about = "Retrieval-grounded question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "COMAI_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "COMAI_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (pretty, json)
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (together, openai, openai-compatible, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Ask a single question from the terminal
    Ask(AskCommand),
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (pretty, json)", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        Commands::Ask(_) => None,
    };

    let config = AppConfig::load_from(cli.workspace, cli.config)?.with_overrides(CliOverrides {
        bind,
        provider: cli.provider,
        model: cli.model,
        log_level: cli.log_level,
        log_format: cli.log_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await.map_err(anyhow::Error::from),
    };

    if let Err(ref e) = result {
        tracing::error!("Command failed: {:#}", e);
    }

    result
}
