//! Resolution Policy
//!
//! Cache-first resolution with network fallback, write-through on success and
//! synthesized fallback content when both sources fail.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::{Result, WorkerError};
use crate::models::{CachedResponse, FetchRequest};
use crate::worker::fallback::{asset_fallback, offline_document};
use crate::worker::network::Fetcher;
use crate::worker::router::Route;

/// Only 2xx responses are written to the cache.
pub fn is_cacheable(response: &CachedResponse) -> bool {
    response.is_success()
}

// == Policy Stats ==
/// Snapshot of resolution counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyStats {
    /// Resolutions answered from the cache
    pub cache_hits: u64,
    /// Network fetches attempted
    pub network_fetches: u64,
    /// Network responses written through to the cache
    pub write_throughs: u64,
    /// Resolutions answered with fallback content
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
    write_throughs: AtomicU64,
    fallbacks: AtomicU64,
}

// == Resolution Policy ==
/// Resolves intercepted requests against one namespace.
///
/// The policy is the only writer of individual entries in its namespace.
pub struct ResolutionPolicy {
    namespace: String,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    fallback_document: FetchRequest,
    counters: Counters,
}

impl ResolutionPolicy {
    pub fn new(
        namespace: String,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        fallback_document: &str,
    ) -> Self {
        Self {
            namespace,
            store,
            fetcher,
            fallback_document: FetchRequest::get(fallback_document),
            counters: Counters::default(),
        }
    }

    /// Resolves a routed request.
    ///
    /// Returns `None` only for [`Route::Passthrough`]; every intercepted
    /// request gets exactly one response.
    pub async fn resolve(&self, route: Route, request: &FetchRequest) -> Option<CachedResponse> {
        match route {
            Route::Passthrough => None,
            Route::Document => Some(self.resolve_document(request).await),
            Route::Asset => Some(self.resolve_asset(request).await),
        }
    }

    /// Document policy: cache, network, cached fallback document, offline notice.
    pub async fn resolve_document(&self, request: &FetchRequest) -> CachedResponse {
        match self.cache_first(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = %request.cache_key(), error = %e, "document unresolved, serving fallback");
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);

                match self.store.lookup(&self.namespace, &self.fallback_document).await {
                    Ok(Some(response)) => response,
                    Ok(None) => offline_document(),
                    Err(e) => {
                        warn!(error = %e, "fallback document lookup failed");
                        offline_document()
                    }
                }
            }
        }
    }

    /// Asset policy: cache, network, typed empty fallback.
    pub async fn resolve_asset(&self, request: &FetchRequest) -> CachedResponse {
        match self.cache_first(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = %request.cache_key(), error = %e, "asset unresolved, serving fallback");
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                asset_fallback(request.path())
            }
        }
    }

    // == Cache First ==
    /// Looks up the cache, then the network, writing cacheable responses through.
    ///
    /// A lookup failure skips the network and goes straight to the fallback path.
    async fn cache_first(&self, request: &FetchRequest) -> Result<CachedResponse> {
        if let Some(response) = self.store.lookup(&self.namespace, request).await? {
            debug!(request = %request.cache_key(), "cache hit");
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(response);
        }

        debug!(request = %request.cache_key(), "cache miss, fetching");
        self.counters.network_fetches.fetch_add(1, Ordering::Relaxed);
        let response = self.fetcher.fetch(request).await?;

        if !is_cacheable(&response) {
            return Err(WorkerError::UnexpectedStatus {
                url: request.url.clone(),
                status: response.status,
            });
        }

        // A failed write-through still returns the fresh response
        match self
            .store
            .put(&self.namespace, request, response.clone())
            .await
        {
            Ok(()) => {
                self.counters.write_throughs.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(request = %request.cache_key(), error = %e, "write-through failed");
            }
        }

        Ok(response)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a snapshot of the resolution counters.
    pub fn stats(&self) -> PolicyStats {
        PolicyStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            network_fetches: self.counters.network_fetches.load(Ordering::Relaxed),
            write_throughs: self.counters.write_throughs.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }
}
