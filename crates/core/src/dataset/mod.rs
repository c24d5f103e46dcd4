//! Restaurant dataset ingestion.
//!
//! A single offline pass: read the source document, parse it into
//! [`Restaurant`] records (coordinates validated on the way), and write the
//! JSON artifact consumed by the map front end. Each run rebuilds the
//! artifact from scratch.

pub mod coords;
pub mod materialize;
pub mod parser;
pub mod record;

use std::path::{Path, PathBuf};

pub use coords::CoordinateQuality;
pub use materialize::{DatasetSummary, read_dataset, to_line_text, write_dataset};
pub use parser::{ParseOutcome, SkipReason, SkippedEntry, SourceFormat, parse};
pub use record::{Coordinates, Restaurant};

use crate::Error;

/// Inputs for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Detected from the source extension when `None`.
    pub format: Option<SourceFormat>,
    /// Fail instead of dropping entries without a name or http(s) URL.
    pub strict: bool,
}

/// What an ingestion run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub format: SourceFormat,
    pub summary: DatasetSummary,
    pub skipped: Vec<SkippedEntry>,
}

/// Resolve the format for `source`, falling back to line text.
pub fn resolve_format(source: &Path, declared: Option<SourceFormat>) -> SourceFormat {
    declared.or_else(|| SourceFormat::from_path(source)).unwrap_or(SourceFormat::LineText)
}

/// Parse `options.source` and materialize it at `options.output`.
///
/// # Errors
///
/// Returns an error if the source cannot be read, a structured source cannot
/// be parsed, strict mode rejects skipped entries, or the artifact cannot be
/// written. Nothing is written when parsing fails.
pub fn ingest(options: &IngestOptions) -> Result<IngestReport, Error> {
    let format = resolve_format(&options.source, options.format);
    let document = std::fs::read_to_string(&options.source)?;

    let outcome = parse(&document, format)?;
    tracing::info!(
        source = %options.source.display(),
        %format,
        entries = outcome.input_count(),
        kept = outcome.records.len(),
        "parsed source document"
    );

    let skipped = outcome.skipped.clone();
    let records = if options.strict { outcome.into_strict()? } else { outcome.records };

    let summary = write_dataset(&options.output, &records)?;
    Ok(IngestReport { format, summary, skipped })
}
