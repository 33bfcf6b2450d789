//! Request models for the worker
//!
//! Defines the intercepted request shape and the normalized identity used as
//! the cache key.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, Uri};

/// Where the requesting context will use the response.
///
/// Mirrors the values a browser sends in `Sec-Fetch-Dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Top-level navigation
    Document,
    Style,
    Script,
    Image,
    Manifest,
    /// Anything else, including plain `fetch()` calls
    Empty,
}

impl Destination {
    /// Parses a `Sec-Fetch-Dest` value.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "style" => Destination::Style,
            "script" => Destination::Script,
            "image" => Destination::Image,
            "manifest" => Destination::Manifest,
            _ => Destination::Empty,
        }
    }

    /// Infers the destination from request headers.
    ///
    /// Uses `Sec-Fetch-Dest` when present; otherwise a GET whose `Accept`
    /// prefers HTML is treated as a navigation.
    pub fn from_headers(method: &Method, headers: &HeaderMap) -> Self {
        if let Some(dest) = headers
            .get("sec-fetch-dest")
            .and_then(|v| v.to_str().ok())
        {
            return Self::parse(dest);
        }

        let accepts_html = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/html"))
            .unwrap_or(false);

        if *method == Method::GET && accepts_html {
            Destination::Document
        } else {
            Destination::Empty
        }
    }
}

// == Fetch Request ==
/// A request intercepted on its way to the network.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method
    pub method: Method,
    /// Normalized URL: an origin-relative path or an absolute URL
    pub url: String,
    /// Intended use of the response
    pub destination: Destination,
    /// Request headers, forwarded on passthrough
    pub headers: HeaderMap,
    /// Request body, forwarded on passthrough
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a request with the given method and URL.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: normalize_url(url),
            destination: Destination::Empty,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET request for a subresource.
    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a GET request for a top-level navigation.
    pub fn navigate(url: &str) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    /// Sets the destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Attaches headers and body.
    pub fn with_parts(mut self, headers: HeaderMap, body: Bytes) -> Self {
        self.headers = headers;
        self.body = body;
        self
    }

    /// Returns true for GET requests, the only method the store accepts.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    // == Cache Key ==
    /// Normalized request identity: method plus URL.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Returns true when the URL names another origin.
    pub fn is_cross_origin(&self) -> bool {
        is_absolute_url(&self.url)
    }

    /// Path portion of the URL without query string.
    pub fn path(&self) -> &str {
        let without_origin = match self.url.find("://") {
            Some(scheme_end) if self.is_cross_origin() => {
                let rest = &self.url[scheme_end + 3..];
                rest.find(|c| c == '/' || c == '?')
                    .map(|i| &rest[i..])
                    .filter(|p| p.starts_with('/'))
                    .unwrap_or("/")
            }
            _ => self.url.as_str(),
        };
        without_origin
            .split('?')
            .next()
            .unwrap_or(without_origin)
    }
}

// == Utility Functions ==
/// Returns true when the URL carries a scheme, i.e. is not origin-relative.
///
/// A `://` inside the query string (`/login?next=https://...`) does not make
/// a URL absolute.
pub fn is_absolute_url(url: &str) -> bool {
    url.parse::<Uri>()
        .map(|uri| uri.scheme().is_some())
        .unwrap_or(false)
}

/// Normalizes a request URL for use as a cache key.
///
/// Drops the fragment, resolves a leading `./` against the root and makes
/// relative paths origin-relative. Absolute URLs keep their origin.
pub fn normalize_url(url: &str) -> String {
    let url = url.split('#').next().unwrap_or("").trim();

    if is_absolute_url(url) {
        return url.to_string();
    }

    let path = if url == "." {
        ""
    } else {
        url.strip_prefix("./").unwrap_or(url)
    };
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
