//! Network Module
//!
//! The network capability the worker falls back to, and its reqwest-backed
//! implementation.

use async_trait::async_trait;
use axum::http::header;
use reqwest::Client;
use tracing::debug;

use crate::error::{Result, WorkerError};
use crate::models::{is_absolute_url, CachedResponse, FetchRequest};

// == Fetcher Trait ==
/// Performs network fetches on behalf of the worker.
///
/// A rejected fetch is an `Err`; any response that arrives, whatever its
/// status, is an `Ok`. Callers decide what a non-2xx status means.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse>;
}

// == HTTP Fetcher ==
/// Forwards requests to a fixed origin over HTTP.
///
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    origin: String,
}

impl HttpFetcher {
    /// Creates a fetcher for the given origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(origin: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| WorkerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a request URL against the origin.
    pub fn resolve_url(&self, url: &str) -> String {
        if is_absolute_url(url) {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
        let url = self.resolve_url(&request.url);
        debug!(method = %request.method, url = %url, "network fetch");

        let mut headers = request.headers.clone();
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        let response = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{} {}: {}", request.method, url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("reading body of {}: {}", url, e)))?;

        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let fetcher = HttpFetcher::new("http://localhost:8080/").unwrap();
        assert_eq!(
            fetcher.resolve_url("/style.css"),
            "http://localhost:8080/style.css"
        );
        assert_eq!(
            fetcher.resolve_url("https://cdn.example.com/x.js"),
            "https://cdn.example.com/x.js"
        );
        assert_eq!(
            fetcher.resolve_url("/login?next=https://example.com/"),
            "http://localhost:8080/login?next=https://example.com/"
        );
    }

    #[tokio::test]
    async fn test_fetch_unreachable_origin_is_rejected() {
        // Port 9 (discard) on localhost is not served in test environments
        let fetcher = HttpFetcher::new("http://127.0.0.1:9").unwrap();
        let result = fetcher.fetch(&FetchRequest::get("/app.js")).await;
        assert!(matches!(result, Err(WorkerError::Network(_))));
    }
}
