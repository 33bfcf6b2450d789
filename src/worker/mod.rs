//! Worker Module
//!
//! The offline cache worker: manifest, lifecycle, routing, resolution and the
//! control channel, plus the registration that hosts worker versions.

pub mod control;
pub mod fallback;
pub mod lifecycle;
pub mod manifest;
pub mod network;
pub mod policy;
pub mod registration;
pub mod router;
pub mod service;


// Re-export public types
pub use lifecycle::{ActivationReport, LifecycleController, LifecycleState};
pub use manifest::{AssetKind, Manifest, ManifestEntry};
pub use network::{Fetcher, HttpFetcher};
pub use policy::{is_cacheable, PolicyStats, ResolutionPolicy};
pub use registration::Registration;
pub use router::{classify, Route};
pub use service::ServiceWorker;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::cache::{CacheStats, CacheStore, MemoryCacheStore};
    use crate::error::{Result, WorkerError};
    use crate::models::{normalize_url, CachedResponse, FetchRequest};
    use crate::worker::manifest::{content_type_for, Manifest};
    use crate::worker::network::Fetcher;

    /// Fetcher serving canned responses, with call counting and an offline switch.
    #[derive(Default)]
    pub struct MockFetcher {
        routes: Mutex<HashMap<String, CachedResponse>>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn offline() -> Self {
            let fetcher = Self::new();
            fetcher.set_offline(true);
            fetcher
        }

        pub fn serving_manifest(manifest: &Manifest) -> Self {
            let fetcher = Self::new();
            for entry in manifest.entries() {
                fetcher.serve(
                    &entry.path,
                    CachedResponse::ok(content_type_for(&entry.path), format!("{} v1", entry.path)),
                );
            }
            fetcher
        }

        pub fn serve(&self, path: &str, response: CachedResponse) {
            self.routes
                .lock()
                .unwrap()
                .insert(normalize_url(path), response);
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<CachedResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(WorkerError::Network("offline".to_string()));
            }
            Ok(self
                .routes
                .lock()
                .unwrap()
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| CachedResponse::new(404, "text/plain", "not found")))
        }
    }

    /// Memory store with injectable open, lookup and delete failures.
    pub struct FlakyStore {
        pub inner: MemoryCacheStore,
        fail_open: bool,
        fail_lookup: bool,
        fail_delete: Option<String>,
    }

    impl FlakyStore {
        fn healthy() -> Self {
            Self {
                inner: MemoryCacheStore::new(100),
                fail_open: false,
                fail_lookup: false,
                fail_delete: None,
            }
        }

        pub fn failing_open() -> Self {
            Self {
                fail_open: true,
                ..Self::healthy()
            }
        }

        pub fn failing_lookup() -> Self {
            Self {
                fail_lookup: true,
                ..Self::healthy()
            }
        }

        pub fn failing_delete(namespace: &str) -> Self {
            Self {
                fail_delete: Some(namespace.to_string()),
                ..Self::healthy()
            }
        }
    }

    #[async_trait]
    impl CacheStore for FlakyStore {
        async fn open(&self, namespace: &str) -> Result<()> {
            if self.fail_open {
                return Err(WorkerError::Storage("storage unavailable".to_string()));
            }
            self.inner.open(namespace).await
        }

        async fn put_all(
            &self,
            namespace: &str,
            entries: Vec<(FetchRequest, CachedResponse)>,
        ) -> Result<()> {
            self.inner.put_all(namespace, entries).await
        }

        async fn lookup(
            &self,
            namespace: &str,
            request: &FetchRequest,
        ) -> Result<Option<CachedResponse>> {
            if self.fail_lookup {
                return Err(WorkerError::Storage("cache read failed".to_string()));
            }
            self.inner.lookup(namespace, request).await
        }

        async fn put(
            &self,
            namespace: &str,
            request: &FetchRequest,
            response: CachedResponse,
        ) -> Result<()> {
            self.inner.put(namespace, request, response).await
        }

        async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
            self.inner.keys(namespace).await
        }

        async fn namespaces(&self) -> Result<Vec<String>> {
            self.inner.namespaces().await
        }

        async fn delete(&self, namespace: &str) -> Result<bool> {
            if self.fail_delete.as_deref() == Some(namespace) {
                return Err(WorkerError::Storage(format!("cannot delete {}", namespace)));
            }
            self.inner.delete(namespace).await
        }

        async fn stats(&self) -> CacheStats {
            self.inner.stats().await
        }
    }
}
