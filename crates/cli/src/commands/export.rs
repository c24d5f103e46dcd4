//! `foodmap export-text`: dataset back to line text.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use foodmap_core::AppConfig;
use foodmap_core::dataset::{read_dataset, to_line_text};

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Dataset artifact to read (defaults to `output_path` from config).
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn export_impl(config: &AppConfig, args: ExportArgs) -> Result<String> {
    let input = args.input.unwrap_or_else(|| config.output_path.clone());
    let records = read_dataset(&input)?;
    Ok(to_line_text(&records))
}
