//! Source document parsing.
//!
//! Two mutually exclusive source formats are accepted:
//!
//! - **Line text**: repeating `name`, `url`, optional `lat,lng` lines, with
//!   blocks separated by a blank line.
//! - **Structured entries**: a `restaurants` list in JSON, TOML or YAML (or a
//!   bare top-level list in JSON and YAML) whose entries carry `name`, `url`
//!   and optional `coordinates`, `tags`, `comment`.
//!
//! Entries without a name or an http(s) URL are dropped. Every drop is kept
//! in [`ParseOutcome::skipped`] so callers can choose to report them.
//!
//! ### Line text cursor
//! The text format is read with a cursor (name, then url, then an optional
//! coordinate line) rather than a fixed line stride. A blank line always
//! resets the cursor, and a line after the URL that is not a coordinate pair
//! opens the next entry, so a missing separator does not shift every
//! following record.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use figment::{
    Figment,
    providers::{Format, Json, Toml, Yaml},
};
use serde::Deserialize;

use super::coords;
use super::record::{Restaurant, is_http_url, split_tags};
use crate::Error;

/// Declared format of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    LineText,
    Json,
    Toml,
    Yaml,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "txt" => Some(Self::LineText),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" | "md" => Ok(Self::LineText),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown source format: {other} (expected text, json, toml or yaml)")),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LineText => "text",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

/// Why an entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingUrl,
    /// The URL slot held something without an http(s) scheme.
    InvalidUrl(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => f.write_str("missing name"),
            Self::MissingUrl => f.write_str("missing url"),
            Self::InvalidUrl(url) => write!(f, "not an http(s) url: {url:?}"),
        }
    }
}

/// A dropped entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based line number for line text, 1-based entry number otherwise.
    pub position: usize,
    pub name: Option<String>,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#{} {name:?}: {}", self.position, self.reason),
            None => write!(f, "#{}: {}", self.position, self.reason),
        }
    }
}

/// Records in source order plus everything that was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<Restaurant>,
    pub skipped: Vec<SkippedEntry>,
}

impl ParseOutcome {
    fn skip(&mut self, position: usize, name: Option<&str>, reason: SkipReason) {
        tracing::debug!(position, name, %reason, "skipping source entry");
        self.skipped.push(SkippedEntry { position, name: name.map(str::to_string), reason });
    }

    /// Number of entries seen in the source, kept or not.
    pub fn input_count(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    /// Fail when anything was dropped; used by strict ingestion.
    pub fn into_strict(self) -> Result<Vec<Restaurant>, Error> {
        if self.skipped.is_empty() {
            return Ok(self.records);
        }
        let listed: Vec<String> = self.skipped.iter().map(ToString::to_string).collect();
        Err(Error::InvalidInput(format!("{} entries skipped: {}", self.skipped.len(), listed.join("; "))))
    }
}

/// Parse a document in the declared format.
///
/// # Errors
///
/// Returns `Error::ParseFailed` when a structured document cannot be
/// deserialized. Line text never fails; malformed blocks are skipped.
pub fn parse(document: &str, format: SourceFormat) -> Result<ParseOutcome, Error> {
    match format {
        SourceFormat::LineText => Ok(parse_line_text(document)),
        structured => parse_structured(document, structured),
    }
}

enum Cursor {
    Name,
    Url { name: String, line: usize },
    Coordinates(Restaurant),
    /// After a rejected URL: swallow the entry's coordinate line, if any.
    Discard,
}

/// Parse the line text format.
pub fn parse_line_text(document: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut cursor = Cursor::Name;

    for (index, raw) in document.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            finish(cursor, &mut outcome);
            cursor = Cursor::Name;
            continue;
        }

        cursor = match cursor {
            Cursor::Name => begin_entry(line, line_no, &mut outcome),
            Cursor::Url { name, line: start } => {
                if is_http_url(line) {
                    Cursor::Coordinates(Restaurant::new(name, line))
                } else {
                    outcome.skip(start, Some(&name), SkipReason::InvalidUrl(line.to_string()));
                    Cursor::Discard
                }
            }
            Cursor::Coordinates(mut record) => {
                if coords::is_valid(line) || looks_numeric(line) {
                    record.coordinates = coords::parse(line);
                    outcome.records.push(record);
                    Cursor::Name
                } else {
                    outcome.records.push(record);
                    begin_entry(line, line_no, &mut outcome)
                }
            }
            Cursor::Discard => {
                if coords::is_valid(line) {
                    Cursor::Name
                } else {
                    begin_entry(line, line_no, &mut outcome)
                }
            }
        };
    }

    finish(cursor, &mut outcome);
    outcome
}

fn begin_entry(line: &str, line_no: usize, outcome: &mut ParseOutcome) -> Cursor {
    if is_http_url(line) {
        outcome.skip(line_no, None, SkipReason::MissingName);
        Cursor::Discard
    } else if coords::is_valid(line) {
        outcome.skip(line_no, None, SkipReason::MissingName);
        Cursor::Name
    } else {
        Cursor::Url { name: line.to_string(), line: line_no }
    }
}

/// A coordinate attempt that failed validation, e.g. `51.5` or `51.5,-0`.
fn looks_numeric(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
        && line.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | ' ' | '\t'))
}

fn finish(cursor: Cursor, outcome: &mut ParseOutcome) {
    match cursor {
        Cursor::Name | Cursor::Discard => {}
        Cursor::Url { name, line } => outcome.skip(line, Some(&name), SkipReason::MissingUrl),
        Cursor::Coordinates(record) => outcome.records.push(record),
    }
}

#[derive(Debug, Deserialize)]
struct EntryDocument {
    #[serde(default)]
    restaurants: Vec<RawEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    name: Option<Scalar>,
    #[serde(default)]
    url: Option<Scalar>,
    #[serde(default)]
    coordinates: Option<Scalar>,
    #[serde(default)]
    tags: Option<TagField>,
    #[serde(default)]
    comment: Option<Scalar>,
}

/// Any field value. Unquoted YAML/TOML numbers and booleans are read as
/// their text; lists and maps are unusable and read as absent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Other(serde::de::IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Scalar::Text(text) => Some(text),
            Scalar::Int(n) => Some(n.to_string()),
            Scalar::Float(n) => Some(n.to_string()),
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagField {
    List(Vec<Scalar>),
    Single(Scalar),
}

impl TagField {
    fn into_tags(self) -> Vec<String> {
        let items = match self {
            TagField::List(items) => items,
            TagField::Single(item) => vec![item],
        };
        items.into_iter().filter_map(Scalar::into_text).flat_map(|item| split_tags(&item)).collect()
    }
}

fn non_empty(value: Option<Scalar>) -> Option<String> {
    value
        .and_then(Scalar::into_text)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Wrap a bare top-level list as `restaurants`, the only shape the
/// extractor reads. TOML has no top-level arrays.
fn wrap_bare_list(document: &str, format: SourceFormat) -> Cow<'_, str> {
    match format {
        SourceFormat::Json if document.trim_start().starts_with('[') => {
            Cow::Owned(format!("{{\"restaurants\": {document}}}"))
        }
        SourceFormat::Yaml if yaml_is_sequence(document) => {
            let mut wrapped = String::from("restaurants:\n");
            for line in document.lines().filter(|line| line.trim_end() != "---") {
                wrapped.push_str("  ");
                wrapped.push_str(line);
                wrapped.push('\n');
            }
            Cow::Owned(wrapped)
        }
        _ => Cow::Borrowed(document),
    }
}

fn yaml_is_sequence(document: &str) -> bool {
    document
        .lines()
        .map(str::trim_end)
        .find(|line| !line.trim().is_empty() && !line.starts_with('#') && !line.starts_with('%') && *line != "---")
        .is_some_and(|line| line == "-" || line.starts_with("- ") || line.starts_with('['))
}

/// Parse a structured entry list.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the document is not valid for `format`, or
/// if `format` is [`SourceFormat::LineText`].
pub fn parse_structured(document: &str, format: SourceFormat) -> Result<ParseOutcome, Error> {
    let document = wrap_bare_list(document, format);
    let figment = match format {
        SourceFormat::Json => Figment::from(Json::string(&document)),
        SourceFormat::Toml => Figment::from(Toml::string(&document)),
        SourceFormat::Yaml => Figment::from(Yaml::string(&document)),
        SourceFormat::LineText => {
            return Err(Error::ParseFailed("line text is not a structured format".into()));
        }
    };

    let entries: EntryDocument = figment
        .extract()
        .map_err(|e| Error::ParseFailed(format!("{format} document: {e}")))?;

    let mut outcome = ParseOutcome::default();

    for (index, entry) in entries.restaurants.into_iter().enumerate() {
        let position = index + 1;
        let name = non_empty(entry.name);
        let url = non_empty(entry.url);

        let Some(name) = name else {
            outcome.skip(position, None, SkipReason::MissingName);
            continue;
        };
        let Some(url) = url else {
            outcome.skip(position, Some(&name), SkipReason::MissingUrl);
            continue;
        };
        if !is_http_url(&url) {
            outcome.skip(position, Some(&name), SkipReason::InvalidUrl(url));
            continue;
        }

        outcome.records.push(Restaurant {
            name,
            url,
            coordinates: non_empty(entry.coordinates).as_deref().and_then(coords::parse),
            tags: entry.tags.map(TagField::into_tags).unwrap_or_default(),
            comment: non_empty(entry.comment),
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::record::Coordinates;

    const SAMPLE: &str = "\
Grounded London
https://maps.app.goo.gl/mTG2MTWQWzVsuGE89
51.5203,-0.0712

Pizza Union
https://maps.app.goo.gl/E6s3Tma5Y9ii5Wpu5

Sushinoen (Japanese)
https://maps.app.goo.gl/FoHeA91P96ZncT8XA
51.5115, -0.0786
";

    #[test]
    fn test_parse_line_text() {
        let outcome = parse_line_text(SAMPLE);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.records.len(), 3);

        assert_eq!(outcome.records[0].name, "Grounded London");
        assert_eq!(outcome.records[0].coordinates, Some(Coordinates { lat: 51.5203, lng: -0.0712 }));
        assert_eq!(outcome.records[1].name, "Pizza Union");
        assert!(outcome.records[1].coordinates.is_none());
        assert_eq!(outcome.records[2].name, "Sushinoen (Japanese)");
        assert_eq!(outcome.records[2].coordinates, Some(Coordinates { lat: 51.5115, lng: -0.0786 }));
    }

    #[test]
    fn test_line_text_missing_separator_does_not_misalign() {
        let doc = "\
DanDan (Chinese)
https://maps.app.goo.gl/ZqokZt26F2YC1zD18
Kova Aldgate
https://maps.app.goo.gl/sCJCw3aEXshmLgQn7
51.5136,-0.0719
JWD Lamian
https://maps.app.goo.gl/FQi7Z1HbkiZYRCvY9
";
        let outcome = parse_line_text(doc);
        let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["DanDan (Chinese)", "Kova Aldgate", "JWD Lamian"]);
        assert!(outcome.records[1].has_coordinates());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_line_text_skips_non_http_url() {
        let doc = "Xi Home Dumpling\nnotaurl\n51.5,-0.1\n\nJWD Lamian\nhttps://maps.app.goo.gl/FQi7Z1HbkiZYRCvY9\n";
        let outcome = parse_line_text(doc);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "JWD Lamian");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].position, 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::InvalidUrl("notaurl".into()));
        assert_eq!(outcome.input_count(), 2);
    }

    #[test]
    fn test_line_text_skips_missing_name_and_url() {
        let doc = "https://maps.app.goo.gl/orphan\n51.5,-0.1\n\nLonely Name\n\n";
        let outcome = parse_line_text(doc);
        assert!(outcome.records.is_empty());
        let reasons: Vec<_> = outcome.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(reasons, vec![SkipReason::MissingName, SkipReason::MissingUrl]);
    }

    #[test]
    fn test_line_text_malformed_coordinates_become_null() {
        let doc = "Little Green Vietnamese\nhttps://maps.app.goo.gl/MYYMkUczYDHkzHL16\n51.5\n";
        let outcome = parse_line_text(doc);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records[0].coordinates.is_none());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_parse_json_entries() {
        let doc = r#"{
            "restaurants": [
                {"name": "Bento Bab (Korean)", "url": "https://maps.app.goo.gl/CkZtHM7o1McDu9Fb8",
                 "coordinates": "51.5145,-0.0755", "tags": "korean  lunch ", "comment": "cash only"},
                {"name": "No Link", "url": "notaurl"},
                {"url": "https://maps.app.goo.gl/ksTBwqg1pxecBgLs7"},
                {"name": "Three Uncles", "url": "https://maps.app.goo.gl/S6w85Mfp9AkDRX9n6", "coordinates": "abc,def"}
            ]
        }"#;
        let outcome = parse(doc, SourceFormat::Json).unwrap();

        assert_eq!(outcome.records.len(), 2);
        let bento = &outcome.records[0];
        assert_eq!(bento.tags, vec!["korean", "lunch"]);
        assert_eq!(bento.comment.as_deref(), Some("cash only"));
        assert_eq!(bento.coordinates, Some(Coordinates { lat: 51.5145, lng: -0.0755 }));
        assert!(outcome.records[1].coordinates.is_none());

        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].reason, SkipReason::InvalidUrl("notaurl".into()));
        assert_eq!(outcome.skipped[1].reason, SkipReason::MissingName);
        assert_eq!(outcome.skipped[1].position, 3);
    }

    #[test]
    fn test_parse_yaml_entries() {
        let doc = "\
restaurants:
  - name: Mr Wang's Aldgate
    url: https://maps.app.goo.gl/ksTBwqg1pxecBgLs7
    coordinates: \"51.5139,-0.0722\"
    tags: chinese dumplings
  - name: \"   \"
    url: https://maps.app.goo.gl/4BpmRFQnWxVT4gdH7
";
        let outcome = parse(doc, SourceFormat::Yaml).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].tags, vec!["chinese", "dumplings"]);
        assert_eq!(outcome.skipped[0].reason, SkipReason::MissingName);
    }

    #[test]
    fn test_parse_toml_entries_with_tag_list() {
        let doc = r#"
[[restaurants]]
name = "Yeye's Noodle & Dumpling (Chinese)"
url = "https://maps.app.goo.gl/A1LU7Y1vbdDmf1pu6"
tags = ["noodles", "chinese"]
comment = "  "
"#;
        let outcome = parse(doc, SourceFormat::Toml).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].tags, vec!["noodles", "chinese"]);
        assert!(outcome.records[0].comment.is_none());
    }

    #[test]
    fn test_parse_structured_invalid_document() {
        let result = parse("{ not json", SourceFormat::Json);
        assert!(matches!(result, Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_structured_unquoted_scalars_are_read_as_text() {
        let doc = "\
restaurants:
  - name: 1947
    url: https://maps.app.goo.gl/AbC1947
    comment: 10
    coordinates: 51.5
    tags: [halal, 24]
  - name: Dishoom
    url: https://maps.app.goo.gl/dishoom
";
        let outcome = parse(doc, SourceFormat::Yaml).unwrap();

        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.records.len(), 2);
        let first = &outcome.records[0];
        assert_eq!(first.name, "1947");
        assert_eq!(first.comment.as_deref(), Some("10"));
        assert!(first.coordinates.is_none());
        assert_eq!(first.tags, vec!["halal", "24"]);
        assert_eq!(outcome.records[1].name, "Dishoom");
    }

    #[test]
    fn test_structured_unusable_fields_skip_only_that_entry() {
        let doc = r#"{"restaurants": [
            {"name": {"en": "Dishoom"}, "url": "https://maps.app.goo.gl/dishoom"},
            {"name": "Numeric Link", "url": 42},
            {"name": "Kova Aldgate", "url": "https://maps.app.goo.gl/sCJCw3aEXshmLgQn7", "coordinates": [51.5, -0.07]}
        ]}"#;
        let outcome = parse(doc, SourceFormat::Json).unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "Kova Aldgate");
        assert!(outcome.records[0].coordinates.is_none());
        assert_eq!(outcome.skipped[0].reason, SkipReason::MissingName);
        assert_eq!(outcome.skipped[1].reason, SkipReason::InvalidUrl("42".into()));
    }

    #[test]
    fn test_structured_bare_list_yaml() {
        let doc = "\
# restaurants near Aldgate
---
- name: Dishoom
  url: https://maps.app.goo.gl/dishoom
  comment: |
    book ahead
- name: Pizza Union
  url: https://maps.app.goo.gl/E6s3Tma5Y9ii5Wpu5
";
        let outcome = parse(doc, SourceFormat::Yaml).unwrap();
        let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Dishoom", "Pizza Union"]);
        assert_eq!(outcome.records[0].comment.as_deref(), Some("book ahead"));
    }

    #[test]
    fn test_structured_bare_list_json() {
        let doc = r#"[
            {"name": "Dishoom", "url": "https://maps.app.goo.gl/dishoom", "coordinates": "51.5136,-0.0719"},
            {"name": "No Link"}
        ]"#;
        let outcome = parse(doc, SourceFormat::Json).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records[0].has_coordinates());
        assert_eq!(outcome.skipped[0].reason, SkipReason::MissingUrl);
    }

    #[test]
    fn test_structured_wrapped_and_bare_agree() {
        let bare = "- name: Dishoom\n  url: https://maps.app.goo.gl/dishoom\n";
        let wrapped = "restaurants:\n  - name: Dishoom\n    url: https://maps.app.goo.gl/dishoom\n";
        assert_eq!(
            parse(bare, SourceFormat::Yaml).unwrap().records,
            parse(wrapped, SourceFormat::Yaml).unwrap().records
        );
    }

    #[test]
    fn test_into_strict() {
        let outcome = parse_line_text("Name Only\nnotaurl\n");
        let err = outcome.into_strict().unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(err.to_string().contains("Name Only"));

        let outcome = parse_line_text(SAMPLE);
        assert_eq!(outcome.into_strict().unwrap().len(), 3);
    }

    #[test]
    fn test_source_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("data/restaurants.md")), Some(SourceFormat::LineText));
        assert_eq!(SourceFormat::from_path(Path::new("data/restaurants.YML")), Some(SourceFormat::Yaml));
        assert_eq!(SourceFormat::from_path(Path::new("data/restaurants")), None);
        assert_eq!("json".parse::<SourceFormat>(), Ok(SourceFormat::Json));
        assert!("csv".parse::<SourceFormat>().is_err());
    }
}
