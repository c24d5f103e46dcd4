//! Restaurant records as written to the dataset artifact.

use serde::{Deserialize, Serialize};

/// A resolved coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Render as `lat,lng` in a form the validator accepts again.
    ///
    /// `f64` display drops a zero fraction (`51` for `51.0`), which would no
    /// longer match `-?\d+\.\d+`, so whole numbers keep one decimal.
    pub fn to_source_string(&self) -> String {
        format!("{},{}", format_component(self.lat), format_component(self.lng))
    }
}

fn format_component(value: f64) -> String {
    if value.fract() == 0.0 { format!("{value:.1}") } else { value.to_string() }
}

/// One restaurant on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    /// Map-provider page the record was derived from.
    pub url: String,
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into(), coordinates: None, tags: Vec::new(), comment: None }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Whether `candidate` carries an explicit http(s) scheme and parses as a URL.
pub fn is_http_url(candidate: &str) -> bool {
    let lower = candidate.trim_start().to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }
    url::Url::parse(candidate.trim()).is_ok_and(|u| u.host_str().is_some())
}

/// Split a whitespace-separated tag string, dropping empty tokens.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_omits_empty_tags_and_comment() {
        let record = Restaurant::new("Pizza Union", "https://maps.app.goo.gl/E6s3Tma5Y9ii5Wpu5");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Pizza Union",
                "url": "https://maps.app.goo.gl/E6s3Tma5Y9ii5Wpu5",
                "coordinates": null
            })
        );
    }

    #[test]
    fn test_serialize_full_record() {
        let record = Restaurant {
            coordinates: Some(Coordinates { lat: 51.5074, lng: -0.1278 }),
            tags: vec!["korean".into(), "lunch".into()],
            comment: Some("get the bibimbap".into()),
            ..Restaurant::new("Bari Bari (Korean)", "https://maps.app.goo.gl/g9dsuQ2AnZguY1jF7")
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["coordinates"]["lat"], 51.5074);
        assert_eq!(json["coordinates"]["lng"], -0.1278);
        assert_eq!(json["tags"], serde_json::json!(["korean", "lunch"]));
        assert_eq!(json["comment"], "get the bibimbap");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let record: Restaurant =
            serde_json::from_str(r#"{"name":"Kova Aldgate","url":"https://example.com","coordinates":null}"#)
                .unwrap();
        assert!(record.tags.is_empty());
        assert!(record.comment.is_none());
        assert!(!record.has_coordinates());
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://maps.app.goo.gl/abc"));
        assert!(is_http_url("http://example.com/path"));
        assert!(is_http_url("HTTPS://EXAMPLE.COM"));
        assert!(!is_http_url("notaurl"));
        assert!(!is_http_url("httpfoo"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("  chinese   noodles\tcheap "), vec!["chinese", "noodles", "cheap"]);
        assert!(split_tags("   ").is_empty());
    }

    #[test]
    fn test_source_string_keeps_decimal_point() {
        let coords = Coordinates { lat: 51.0, lng: -0.1278 };
        assert_eq!(coords.to_source_string(), "51.0,-0.1278");
    }
}
