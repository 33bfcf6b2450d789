//! Service Worker
//!
//! One deployed version of the worker: its lifecycle plus the resolution
//! policy bound to its namespace.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheNamespace, CacheStore};
use crate::config::Config;
use crate::error::Result;
use crate::models::{CachedResponse, ControlMessage, FetchRequest};
use crate::worker::control;
use crate::worker::lifecycle::{ActivationReport, LifecycleController, LifecycleState};
use crate::worker::manifest::Manifest;
use crate::worker::network::Fetcher;
use crate::worker::policy::{PolicyStats, ResolutionPolicy};
use crate::worker::router::classify;

pub struct ServiceWorker {
    lifecycle: LifecycleController,
    policy: ResolutionPolicy,
}

impl ServiceWorker {
    pub fn new(
        namespace: CacheNamespace,
        manifest: Manifest,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        fallback_document: &str,
        eager_activation: bool,
    ) -> Self {
        let policy = ResolutionPolicy::new(
            namespace.id(),
            store.clone(),
            fetcher.clone(),
            fallback_document,
        );
        let lifecycle =
            LifecycleController::new(namespace, manifest, store, fetcher, eager_activation);
        Self { lifecycle, policy }
    }

    /// Builds the worker described by the configuration, with the bundled manifest.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::new(
            CacheNamespace::new(&config.app_name, &config.cache_version),
            Manifest::bundled(),
            store,
            fetcher,
            &config.fallback_document,
            config.eager_activation,
        )
    }

    pub fn namespace(&self) -> &CacheNamespace {
        self.lifecycle.namespace()
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    pub async fn install(&self) -> Result<()> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    pub async fn retire(&self) {
        self.lifecycle.retire().await
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.lifecycle.wants_skip_waiting()
    }

    /// Handles an intercepted request.
    ///
    /// Returns `None` when the request is not intercepted and should go to
    /// the network untouched.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<CachedResponse> {
        let route = classify(request);
        self.policy.resolve(route, request).await
    }

    /// Handles a control channel message.
    pub fn post_message(&self, raw: &Value) -> Option<ControlMessage> {
        control::dispatch(&self.lifecycle, raw)
    }

    pub fn stats(&self) -> PolicyStats {
        self.policy.stats()
    }
}
