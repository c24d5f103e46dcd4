//! `foodmap ingest`: source document to JSON dataset.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use foodmap_core::AppConfig;
use foodmap_core::dataset::{IngestOptions, SourceFormat, ingest};
use serde::Serialize;

#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    /// Source document (defaults to `source_path` from config).
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Dataset artifact to write (defaults to `output_path` from config).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Source format: text, json, toml or yaml. Detected from the extension when omitted.
    #[arg(long)]
    pub format: Option<SourceFormat>,

    /// Fail when any entry lacks a name or an http(s) URL.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    pub output: PathBuf,
    pub format: String,
    pub total: usize,
    pub with_coordinates: usize,
    /// Human-readable reasons for every dropped entry.
    pub skipped: Vec<String>,
}

pub fn ingest_impl(config: &AppConfig, args: IngestArgs) -> Result<IngestOutput> {
    let options = IngestOptions {
        source: args.source.unwrap_or_else(|| config.source_path.clone()),
        output: args.output.unwrap_or_else(|| config.output_path.clone()),
        format: args.format,
        strict: args.strict,
    };

    let report = ingest(&options)?;

    tracing::info!(
        "Parsed {} restaurants, {} with coordinates",
        report.summary.total,
        report.summary.with_coordinates
    );

    Ok(IngestOutput {
        output: options.output,
        format: report.format.to_string(),
        total: report.summary.total,
        with_coordinates: report.summary.with_coordinates,
        skipped: report.skipped.iter().map(ToString::to_string).collect(),
    })
}
