//! Quire CLI - multi-format document engine.
//!
//! Provides commands for:
//! - `detect`: Report the detected format of a file
//! - `render`: Render a file to HTML
//! - `validate`: Report dialect diagnostics
//! - `formats`: List the format catalog
//! - `stats`: Show parser registry coverage

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{DetectArgs, FormatsArgs, RenderArgs, StatsArgs, ValidateArgs};
use output::Output;

/// Quire - multi-format document engine.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long, global = true, env = "QUIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (debug logs on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the format of a file.
    Detect(DetectArgs),
    /// Render a file to HTML.
    Render(RenderArgs),
    /// Validate a file and report problems.
    Validate(ValidateArgs),
    /// List supported formats.
    Formats(FormatsArgs),
    /// Show parser statistics.
    Stats(StatsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Detect(args) => args.execute(&cli.global),
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Validate(args) => args.execute(&cli.global),
        Commands::Formats(args) => args.execute(&cli.global),
        Commands::Stats(args) => args.execute(&cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
