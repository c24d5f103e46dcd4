//! Coordinate string validation.
//!
//! Map providers return coordinates at varying precision depending on how
//! they were extracted (URL parameter vs. clipboard copy). Ingestion only
//! needs the syntactic check; the high-precision check is the acceptance
//! gate for freshly scraped values.

use std::sync::LazyLock;

use regex::Regex;

use super::record::Coordinates;

/// Minimum fraction digits per component for a high-precision pair.
pub const HIGH_PRECISION_DIGITS: usize = 10;

static LENIENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[0-9]+\.([0-9]+))\s*,\s*(-?[0-9]+\.([0-9]+))$").expect("static regex"));

static STRICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+\.[0-9]+,-?[0-9]+\.[0-9]+$").expect("static regex"));

/// Trust level of a candidate coordinate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateQuality {
    Invalid,
    LowPrecision,
    HighPrecision,
}

/// `lat,lng` with optional whitespace around the comma.
pub fn is_valid(candidate: &str) -> bool {
    LENIENT.is_match(candidate.trim())
}

/// `lat,lng` with no whitespace anywhere between the components.
pub fn is_valid_strict(candidate: &str) -> bool {
    STRICT.is_match(candidate.trim())
}

/// Valid, and both fractions carry at least [`HIGH_PRECISION_DIGITS`] digits.
pub fn is_high_precision(candidate: &str) -> bool {
    classify(candidate) == CoordinateQuality::HighPrecision
}

pub fn classify(candidate: &str) -> CoordinateQuality {
    let Some(caps) = LENIENT.captures(candidate.trim()) else {
        return CoordinateQuality::Invalid;
    };
    let lat_digits = caps.get(2).map_or(0, |m| m.as_str().len());
    let lng_digits = caps.get(4).map_or(0, |m| m.as_str().len());

    if lat_digits >= HIGH_PRECISION_DIGITS && lng_digits >= HIGH_PRECISION_DIGITS {
        CoordinateQuality::HighPrecision
    } else {
        CoordinateQuality::LowPrecision
    }
}

/// Parse a valid pair; anything malformed or non-finite yields `None`.
pub fn parse(candidate: &str) -> Option<Coordinates> {
    let caps = LENIENT.captures(candidate.trim())?;
    let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
    let lng: f64 = caps.get(3)?.as_str().parse().ok()?;

    (lat.is_finite() && lng.is_finite()).then_some(Coordinates { lat, lng })
}
