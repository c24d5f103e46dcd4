//! foodmap command line entry point.
//!
//! Builds the restaurant dataset and drives the offline caching worker
//! against the SQLite cache and the live network. Command results are
//! printed to stdout as JSON; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use foodmap_core::AppConfig;
use foodmap_core::config::LogFormat;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::export::ExportArgs;
use commands::ingest::IngestArgs;
use commands::validate::ValidateArgs;
use commands::worker::WorkerCommand;

#[derive(Debug, Parser)]
#[command(name = "foodmap", version, about = "Restaurant map dataset and offline cache tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse the source document and write the JSON dataset.
    Ingest(IngestArgs),

    /// Check coordinate strings; exits non-zero on the first failure.
    Validate(ValidateArgs),

    /// Print a dataset back in the line-oriented source format.
    ExportText(ExportArgs),

    /// Run the caching worker against the on-disk cache.
    #[command(subcommand)]
    Worker(WorkerCommand),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    init_tracing(config.log_format);

    match cli.command {
        Command::Ingest(args) => print_json(&commands::ingest::ingest_impl(&config, args)?),
        Command::Validate(args) => print_json(&commands::validate::validate_impl(&args)?),
        Command::ExportText(args) => {
            print!("{}", commands::export::export_impl(&config, args)?);
            Ok(())
        }
        Command::Worker(command) => commands::worker::run(&config, command).await,
    }
}
