//! `foodmap validate`: check coordinate strings.

use anyhow::{Result, bail};
use clap::Args;
use foodmap_core::dataset::CoordinateQuality;
use foodmap_core::dataset::coords::{HIGH_PRECISION_DIGITS, classify};
use serde::Serialize;

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Coordinate strings such as `51.5203,-0.0712`.
    #[arg(required = true)]
    pub coordinates: Vec<String>,

    /// Also reject values with fewer than 10 fraction digits per component.
    #[arg(long)]
    pub high_precision: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub checked: usize,
    pub high_precision: usize,
}

/// Stops at the first failing value.
pub fn validate_impl(args: &ValidateArgs) -> Result<ValidateOutput> {
    let mut high_precision = 0;

    for candidate in &args.coordinates {
        match classify(candidate) {
            CoordinateQuality::Invalid => bail!("INVALID_INPUT: not a coordinate pair: {candidate:?}"),
            CoordinateQuality::LowPrecision if args.high_precision => {
                bail!("INVALID_INPUT: fewer than {HIGH_PRECISION_DIGITS} fraction digits: {candidate:?}")
            }
            CoordinateQuality::LowPrecision => {}
            CoordinateQuality::HighPrecision => high_precision += 1,
        }
    }

    Ok(ValidateOutput { checked: args.coordinates.len(), high_precision })
}
