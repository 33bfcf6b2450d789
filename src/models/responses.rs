//! Response models
//!
//! The stored response snapshot returned by every resolution, and the DTOs
//! serialized by the control surface.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::worker::{LifecycleState, PolicyStats};

// == Cached Response ==
/// A response snapshot: status, headers and body.
///
/// This is what the cache stores and what every resolution returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lower-cased names
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
}

impl CachedResponse {
    /// Creates a response with a single `content-type` header.
    pub fn new(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// Creates a 200 response.
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self::new(200, content_type, body)
    }

    /// Returns the first header value with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the `content-type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true if the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            // Hop-by-hop and length headers are recomputed by the server
            if name.eq_ignore_ascii_case("content-length")
                || name.eq_ignore_ascii_case("transfer-encoding")
                || name.eq_ignore_ascii_case("connection")
            {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
        }

        response
    }
}

/// Response body for the status endpoint (GET /__worker/status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Lifecycle state of the active worker, if any
    pub active: Option<WorkerStatus>,
    /// Lifecycle state of the waiting worker, if any
    pub waiting: Option<WorkerStatus>,
    /// Every namespace present in the cache store
    pub namespaces: Vec<String>,
    /// Connected client contexts
    pub clients: usize,
    /// Cache store counters
    pub cache: CacheStats,
    /// Share of cache lookups that found an entry
    pub hit_rate: f64,
    /// Resolution counters of the active worker
    pub resolution: Option<PolicyStats>,
}

/// Response body for client attachment (POST /__worker/clients/:id)
#[derive(Debug, Clone, Serialize)]
pub struct ClientResponse {
    /// Client context identifier
    pub id: String,
    /// Namespace of the worker controlling the client, if any
    pub controller: Option<String>,
}

/// A single worker as reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    /// Namespace identifier, `{appName}-{version}`
    pub namespace: String,
    /// Current lifecycle state
    pub state: LifecycleState,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_response_header_lookup() {
        let resp = CachedResponse::ok("text/css", "body{}");
        assert_eq!(resp.content_type(), Some("text/css"));
        assert_eq!(resp.header("Content-Type"), Some("text/css"));
        assert!(resp.header("etag").is_none());
    }

    #[test]
    fn test_cached_response_success_range() {
        assert!(CachedResponse::new(200, "text/plain", "").is_success());
        assert!(CachedResponse::new(204, "text/plain", "").is_success());
        assert!(!CachedResponse::new(304, "text/plain", "").is_success());
        assert!(!CachedResponse::new(404, "text/plain", "").is_success());
    }

    #[test]
    fn test_into_response_copies_status_and_headers() {
        let mut cached = CachedResponse::new(404, "text/plain", "missing");
        cached
            .headers
            .push(("content-length".to_string(), "999".to_string()));
        let response = cached.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
