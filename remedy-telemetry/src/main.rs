//! Telemetry log tooling for remedy.
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use remedy_telemetry::{LogConfig, init_logging, summarize_log};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "remedy-telemetry", about = "Inspect remedy status code telemetry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count recorded status codes in a JSONL telemetry log
    Summarize {
        /// Telemetry log written by `remedy classify --record`
        file: PathBuf,

        /// Output format (json or pretty)
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    match cli.command {
        Commands::Summarize { file, format } => {
            let summary = summarize_log(&file)
                .with_context(|| format!("summarizing {}", file.display()))?;
            debug!(total = summary.total, codes = summary.codes.len(), "summarized telemetry log");

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
                OutputFormat::Pretty => print!("{}", summary.to_pretty()),
            }
        }
    }

    Ok(())
}
