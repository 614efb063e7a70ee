//! VirusTotal to MISP CLI
//!
//! Attaches the VirusTotal report for a file checksum to a MISP event.

mod commands;
mod output;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use vt_enrich_core::EnrichError;

#[derive(Parser)]
#[command(name = "vt-enrich")]
#[command(author = "Kief Studio")]
#[command(version)]
#[command(about = "Attach VirusTotal file reports to MISP events", long_about = None)]
struct Cli {
    /// The checksum value has to be MD5, SHA-1 or SHA-256 for checking on VT
    #[arg(short, long)]
    checksum: String,

    /// The UUID of the event in MISP
    #[arg(short, long)]
    uuid: String,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build the objects but do not update the event
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show errors)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging - default to warn to keep output clean
    let filter = if cli.verbose {
        "vt_enrich=debug,vt_enrich_core=debug"
    } else if cli.quiet {
        "vt_enrich=error,vt_enrich_core=error"
    } else {
        "vt_enrich=warn,vt_enrich_core=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = commands::enrich::Args {
        checksum: cli.checksum,
        uuid: cli.uuid,
        config: cli.config,
        dry_run: cli.dry_run,
        format: cli.format,
        quiet: cli.quiet,
    };

    match commands::enrich::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Quitting ->".red().bold(), diagnostic(&e));
            ExitCode::from(exit_status(&e))
        }
    }
}

fn enrich_error(err: &anyhow::Error) -> Option<&EnrichError> {
    err.chain().find_map(|cause| cause.downcast_ref::<EnrichError>())
}

/// Map an error to the process exit status of its category
fn exit_status(err: &anyhow::Error) -> u8 {
    enrich_error(err).map(|e| e.exit_code() as u8).unwrap_or(1)
}

/// Error message prefixed with the pipeline stage that failed, if any
fn diagnostic(err: &anyhow::Error) -> String {
    match enrich_error(err).and_then(EnrichError::stage) {
        Some(stage) => format!("[{}] {:#}", stage, err),
        None => format!("{:#}", err),
    }
}
