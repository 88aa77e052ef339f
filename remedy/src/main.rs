//! remedy - turn pipeline failures into actionable errors.
#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use remedy_common::config::EnvParser;
use remedy_common::{
    ActionableError, Classified, Classifier, LogConfig, Phase, RunContext, RunContextHolder,
    RunOverrides, StatusCode, init_logging,
};
use remedy_telemetry::JsonlRecorder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(
    name = "remedy",
    version,
    about = "Classify pipeline failures into status codes and suggestions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a failure raised during a pipeline phase
    Classify {
        /// Phase that produced the failure (build, deploy, init, ...)
        #[arg(long)]
        phase: Phase,

        #[command(flatten)]
        run: RunArgs,

        /// Append the resolved status code to this JSONL telemetry log
        #[arg(long, env = "REMEDY_TELEMETRY_FILE")]
        record: Option<PathBuf>,

        /// Output format (json or pretty)
        #[arg(long, default_value = "pretty")]
        format: OutputFormat,

        /// Failure text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Match a failure against every phase's known problems
    Explain {
        #[command(flatten)]
        run: RunArgs,

        /// Output format (json or pretty)
        #[arg(long, default_value = "pretty")]
        format: OutputFormat,

        /// Failure text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// List status codes
    Codes {
        /// Only codes raised by this phase
        #[arg(long)]
        phase: Option<Phase>,

        /// Output format (json or pretty)
        #[arg(long, default_value = "pretty")]
        format: OutputFormat,
    },
}

/// Run settings; flags override `REMEDY_*` environment values.
#[derive(Args)]
struct RunArgs {
    /// Repository images are pushed to
    #[arg(long)]
    default_repo: Option<String>,

    /// Active Kubernetes context
    #[arg(long)]
    kube_context: Option<String>,

    /// Persisted config file to consult for default-repo
    #[arg(long)]
    global_config: Option<PathBuf>,
}

impl RunArgs {
    fn into_context(self) -> RunContext {
        let mut parser = EnvParser::new();
        let overrides = RunOverrides {
            default_repo: self.default_repo,
            kube_context: self.kube_context,
            global_config: self.global_config,
        };
        let ctx = RunContext::resolve(&mut parser, overrides);
        for err in parser.take_errors() {
            warn!(error = %err, "ignoring invalid environment value");
        }
        ctx
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("warn").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    match cli.command {
        Commands::Classify {
            phase,
            run,
            record,
            format,
            message,
        } => {
            let mut classifier = build_classifier(run.into_context());
            if let Some(path) = record {
                let recorder = JsonlRecorder::open(&path)
                    .with_context(|| format!("opening telemetry log {}", path.display()))?;
                classifier = classifier.with_recorder(Arc::new(recorder));
            }

            let err = anyhow!(message.join(" "));
            let actionable = classifier.to_actionable_error(phase, &*err);
            debug!(%phase, code = %actionable.status_code().code_string(), "classified");
            print_actionable(&actionable, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Explain {
            run,
            format,
            message,
        } => {
            let classifier = build_classifier(run.into_context());
            let err = anyhow!(message.join(" "));

            let Some(problem) = classifier.show_actionable_error(&*err) else {
                eprintln!("No known problem matches this error.");
                return Ok(ExitCode::FAILURE);
            };
            let actionable = ActionableError::new(
                problem.status_code(),
                problem.description(),
                problem.suggestions(),
            );
            print_actionable(&actionable, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Codes { phase, format } => {
            let codes: Vec<StatusCode> = StatusCode::all()
                .iter()
                .copied()
                .filter(|code| phase.is_none_or(|p| code.phase() == Some(p)))
                .collect();
            print_codes(&codes, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_classifier(ctx: RunContext) -> Classifier {
    Classifier::new(Arc::new(RunContextHolder::with_context(ctx)))
}

fn print_actionable(actionable: &ActionableError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(actionable)?),
        OutputFormat::Pretty => print!("{}", actionable.format_full()),
    }
    Ok(())
}

fn print_codes(codes: &[StatusCode], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = codes
                .iter()
                .map(|code| {
                    serde_json::json!({
                        "code": code,
                        "code_string": code.code_string(),
                        "phase": code.phase(),
                        "message": code.message(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Pretty => {
            for code in codes {
                let name = serde_json::to_value(code)?;
                println!(
                    "{}  {:<34} {}",
                    code.code_string(),
                    name.as_str().unwrap_or_default(),
                    code.message()
                );
            }
        }
    }
    Ok(())
}
