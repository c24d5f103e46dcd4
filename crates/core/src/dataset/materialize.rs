//! Dataset artifact I/O.
//!
//! The artifact is a pretty-printed JSON array of [`Restaurant`] in source
//! order. Writing always replaces the previous file wholesale.

use std::path::Path;

use serde::Serialize;

use super::record::Restaurant;
use crate::Error;

/// Counts reported after materializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub with_coordinates: usize,
}

impl DatasetSummary {
    pub fn of(records: &[Restaurant]) -> Self {
        Self { total: records.len(), with_coordinates: records.iter().filter(|r| r.has_coordinates()).count() }
    }
}

/// Write `records` to `path`, creating the parent directory if needed.
///
/// There is no temp-file swap: an interrupted write can leave a truncated
/// artifact, and the whole ingestion run should be repeated.
pub fn write_dataset(path: impl AsRef<Path>, records: &[Restaurant]) -> Result<DatasetSummary, Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;

    let summary = DatasetSummary::of(records);
    tracing::info!(
        path = %path.display(),
        total = summary.total,
        with_coordinates = summary.with_coordinates,
        "dataset written"
    );
    Ok(summary)
}

/// Load a previously written artifact.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<Restaurant>, Error> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Render records in the line text source format.
///
/// Each block is `name`, `url`, the coordinate line when resolved, then a
/// blank separator. Tags and comments have no slot in this format and are
/// not written.
pub fn to_line_text(records: &[Restaurant]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.name);
        out.push('\n');
        out.push_str(&record.url);
        out.push('\n');
        if let Some(coords) = &record.coordinates {
            out.push_str(&coords.to_source_string());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
