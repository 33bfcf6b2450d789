//! Lifecycle Controller
//!
//! Drives one worker version through install, waiting and activation, and
//! owns namespace creation and deletion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::cache::{CacheNamespace, CacheStore};
use crate::error::{Result, WorkerError};
use crate::worker::manifest::Manifest;
use crate::worker::network::Fetcher;
use crate::worker::policy::is_cacheable;

// == Lifecycle State ==
/// Lifecycle of a single worker version.
///
/// `installing → waiting → active`; `redundant` once install fails or a
/// newer version takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    Redundant,
}

/// Outcome of the stale-namespace purge run during activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale namespaces that were deleted
    pub purged: Vec<String>,
    /// Stale namespaces whose deletion failed
    pub failed: Vec<String>,
}

// == Lifecycle Controller ==
pub struct LifecycleController {
    namespace: CacheNamespace,
    manifest: Manifest,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<LifecycleState>,
    /// Set once the waiting phase may be skipped
    skip_waiting: AtomicBool,
    /// Skip waiting as soon as install succeeds
    eager_activation: bool,
}

impl LifecycleController {
    pub fn new(
        namespace: CacheNamespace,
        manifest: Manifest,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        eager_activation: bool,
    ) -> Self {
        Self {
            namespace,
            manifest,
            store,
            fetcher,
            state: RwLock::new(LifecycleState::Installing),
            skip_waiting: AtomicBool::new(false),
            eager_activation,
        }
    }

    pub fn namespace(&self) -> &CacheNamespace {
        &self.namespace
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    // == Install ==
    /// Populates the current namespace with every manifest asset.
    ///
    /// All assets are fetched before anything is written; one failed or
    /// non-2xx fetch aborts the install and leaves the store untouched. On
    /// failure the worker becomes redundant.
    pub async fn install(&self) -> Result<()> {
        self.expect_state(LifecycleState::Installing, "install").await?;
        let namespace = self.namespace.id();
        info!(namespace = %namespace, assets = self.manifest.len(), "installing");
        if self.manifest.is_empty() {
            warn!(namespace = %namespace, "installing with an empty manifest");
        }

        match self.populate(&namespace).await {
            Ok(()) => {
                *self.state.write().await = LifecycleState::Waiting;
                if self.eager_activation {
                    self.skip_waiting();
                }
                info!(namespace = %namespace, "installed, waiting for activation");
                Ok(())
            }
            Err(e) => {
                *self.state.write().await = LifecycleState::Redundant;
                error!(namespace = %namespace, error = %e, "install failed");
                Err(WorkerError::InstallFailed {
                    namespace,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn populate(&self, namespace: &str) -> Result<()> {
        self.store.open(namespace).await?;
        if self.already_cached(namespace).await {
            info!(namespace, "manifest already cached, skipping fetch");
            return Ok(());
        }

        let mut entries = Vec::with_capacity(self.manifest.len());
        for entry in self.manifest.entries() {
            let request = entry.request();
            let response = self.fetcher.fetch(&request).await?;
            if !is_cacheable(&response) {
                return Err(WorkerError::UnexpectedStatus {
                    url: request.url.clone(),
                    status: response.status,
                });
            }
            entries.push((request, response));
        }

        self.store.put_all(namespace, entries).await
    }

    /// True when a persisted namespace already holds every manifest entry.
    async fn already_cached(&self, namespace: &str) -> bool {
        match self.store.keys(namespace).await {
            Ok(keys) => self
                .manifest
                .entries()
                .iter()
                .all(|entry| keys.contains(&entry.request().cache_key())),
            Err(_) => false,
        }
    }

    // == Activate ==
    /// Deletes every namespace other than the current one, then becomes active.
    ///
    /// Purge failures are logged and skipped; they never block activation.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.expect_state(LifecycleState::Waiting, "activate").await?;
        let current = self.namespace.id();
        let mut report = ActivationReport::default();

        let existing = match self.store.namespaces().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "could not enumerate namespaces, skipping purge");
                Vec::new()
            }
        };

        for name in existing.into_iter().filter(|n| self.namespace.is_stale(n)) {
            match self.store.delete(&name).await {
                Ok(true) => {
                    info!(namespace = %name, "purged stale namespace");
                    report.purged.push(name);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(namespace = %name, error = %e, "failed to purge stale namespace");
                    report.failed.push(name);
                }
            }
        }

        *self.state.write().await = LifecycleState::Active;
        info!(namespace = %current, purged = report.purged.len(), "activated");
        Ok(report)
    }

    /// Marks the worker as superseded.
    pub async fn retire(&self) {
        *self.state.write().await = LifecycleState::Redundant;
        info!(namespace = %self.namespace, "retired");
    }

    // == Skip Waiting ==
    /// Allows promotion without waiting for existing clients to close.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn expect_state(&self, expected: LifecycleState, action: &str) -> Result<()> {
        let state = self.state().await;
        if state == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidTransition(format!(
                "cannot {} {} while {:?}",
                action, self.namespace, state
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::models::{CachedResponse, FetchRequest};
    use crate::worker::test_support::{FlakyStore, MockFetcher};

    fn controller(
        version: &str,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<MockFetcher>,
        eager: bool,
    ) -> LifecycleController {
        LifecycleController::new(
            CacheNamespace::new("app", version),
            Manifest::bundled(),
            store,
            fetcher,
            eager,
        )
    }

    #[tokio::test]
    async fn test_install_populates_every_manifest_asset() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v1", store.clone(), fetcher, true);

        lifecycle.install().await.unwrap();

        assert_eq!(lifecycle.state().await, LifecycleState::Waiting);
        for entry in Manifest::bundled().entries() {
            let found = store.lookup("app-v1", &entry.request()).await.unwrap();
            assert!(found.is_some(), "{} missing after install", entry.path);
        }
    }

    #[tokio::test]
    async fn test_install_is_atomic() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        fetcher.serve("/app.js", CachedResponse::new(404, "text/plain", "gone"));
        let lifecycle = controller("v1", store.clone(), fetcher, true);

        let result = lifecycle.install().await;

        assert!(matches!(result, Err(WorkerError::InstallFailed { .. })));
        assert_eq!(lifecycle.state().await, LifecycleState::Redundant);
        assert!(store.keys("app-v1").await.unwrap().is_empty());
        assert!(!lifecycle.wants_skip_waiting());
    }

    #[tokio::test]
    async fn test_install_fails_when_offline() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::offline());
        let lifecycle = controller("v1", store, fetcher, true);

        assert!(lifecycle.install().await.is_err());
        assert_eq!(lifecycle.state().await, LifecycleState::Redundant);
    }

    #[tokio::test]
    async fn test_install_fails_when_store_cannot_open() {
        let store = Arc::new(FlakyStore::failing_open());
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v1", store, fetcher.clone(), true);

        assert!(lifecycle.install().await.is_err());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_eager_install_requests_skip_waiting() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));

        let eager = controller("v1", store.clone(), fetcher.clone(), true);
        eager.install().await.unwrap();
        assert!(eager.wants_skip_waiting());

        let conservative = controller("v2", store, fetcher, false);
        conservative.install().await.unwrap();
        assert!(!conservative.wants_skip_waiting());
    }

    #[tokio::test]
    async fn test_activate_purges_stale_namespaces() {
        let store = Arc::new(MemoryCacheStore::new(100));
        store.open("app-v1").await.unwrap();
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v2", store.clone(), fetcher, true);

        lifecycle.install().await.unwrap();
        assert_eq!(store.namespaces().await.unwrap(), vec!["app-v1", "app-v2"]);

        let report = lifecycle.activate().await.unwrap();

        assert_eq!(report.purged, vec!["app-v1"]);
        assert_eq!(store.namespaces().await.unwrap(), vec!["app-v2"]);
        assert_eq!(lifecycle.state().await, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_activate_continues_past_purge_failures() {
        let store = Arc::new(FlakyStore::failing_delete("app-v0"));
        store.inner.open("app-v0").await.unwrap();
        store.inner.open("app-v1").await.unwrap();
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v2", store.clone(), fetcher, true);

        lifecycle.install().await.unwrap();
        let report = lifecycle.activate().await.unwrap();

        assert_eq!(report.failed, vec!["app-v0"]);
        assert_eq!(report.purged, vec!["app-v1"]);
        assert_eq!(lifecycle.state().await, LifecycleState::Active);
        assert_eq!(
            store.inner.namespaces().await.unwrap(),
            vec!["app-v0", "app-v2"]
        );
    }

    #[tokio::test]
    async fn test_activate_requires_waiting() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::new());
        let lifecycle = controller("v1", store, fetcher, true);

        let result = lifecycle.activate().await;
        assert!(matches!(result, Err(WorkerError::InvalidTransition(_))));
        assert_eq!(lifecycle.state().await, LifecycleState::Installing);
    }

    #[tokio::test]
    async fn test_install_only_once() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v1", store, fetcher, true);

        lifecycle.install().await.unwrap();
        assert!(matches!(
            lifecycle.install().await,
            Err(WorkerError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_retire() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let lifecycle = controller("v1", store.clone(), fetcher, true);
        lifecycle.install().await.unwrap();
        lifecycle.activate().await.unwrap();

        lifecycle.retire().await;

        assert_eq!(lifecycle.state().await, LifecycleState::Redundant);
        // Retiring never deletes data; the successor's activation does
        assert!(store
            .lookup("app-v1", &FetchRequest::get("/"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_install_reuses_cached_manifest() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let online = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        controller("v1", store.clone(), online, true)
            .install()
            .await
            .unwrap();

        // Same version again, e.g. after a restart, with no network
        let offline = Arc::new(MockFetcher::offline());
        let lifecycle = controller("v1", store.clone(), offline.clone(), true);
        lifecycle.install().await.unwrap();

        assert_eq!(lifecycle.state().await, LifecycleState::Waiting);
        assert_eq!(offline.calls(), 0);
    }
}
