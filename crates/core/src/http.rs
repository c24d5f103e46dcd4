//! Request and response snapshots exchanged between the worker, the
//! network and the cache stores.
//!
//! These are plain values: a [`Response`] body is a cheaply clonable
//! [`Bytes`], so "cloning before caching" is a refcount bump.

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// What the request is for, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// A top-level navigation.
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    #[default]
    Other,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub destination: Destination,
}

impl Request {
    /// A plain GET.
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".into(), destination: Destination::Other }
    }

    /// A GET issued by a document navigation.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, ..Self::get(url) }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// URL used for cache identity: the request URL without its fragment.
    pub fn cache_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }

    /// Stable store key for this request's identity.
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, &self.cache_url())
    }
}

/// How the response may be observed by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin.
    #[default]
    Basic,
    /// Cross-origin with CORS headers.
    Cors,
    /// Cross-origin without CORS; status and body are hidden.
    Opaque,
    /// A network error surfaced as a response.
    Error,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(ResponseType::Basic),
            "cors" => Some(ResponseType::Cors),
            "opaque" => Some(ResponseType::Opaque),
            "error" => Some(ResponseType::Error),
            _ => None,
        }
    }
}

/// A response snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub kind: ResponseType,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), kind: ResponseType::Basic }
    }

    /// The synthetic `503 Offline` returned when neither cache nor network can answer.
    pub fn offline() -> Self {
        Self::new(503, Bytes::from_static(b"Offline")).with_header("content-type", "text/plain")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// First header value for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A plain 200 the page could read: only these are ever stored.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && matches!(self.kind, ResponseType::Basic | ResponseType::Cors)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
