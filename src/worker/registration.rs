//! Registration
//!
//! Holds the active and waiting workers for one origin, the connected
//! clients, and decides when a waiting worker is promoted.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::models::{CachedResponse, FetchRequest, StatusResponse, WorkerStatus};
use crate::worker::network::Fetcher;
use crate::worker::service::ServiceWorker;

// == Registration ==
pub struct Registration {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
    /// Client id → namespace of the worker controlling it
    clients: RwLock<HashMap<String, Option<String>>>,
    /// Serializes install/activate cycles
    cycle: Mutex<()>,
}

impl Registration {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            active: RwLock::new(None),
            waiting: RwLock::new(None),
            clients: RwLock::new(HashMap::new()),
            cycle: Mutex::new(()),
        }
    }

    pub fn store(&self) -> Arc<dyn CacheStore> {
        self.store.clone()
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    // == Register ==
    /// Installs a worker and promotes it when allowed.
    ///
    /// A failed install leaves the current active worker serving.
    pub async fn register(&self, worker: Arc<ServiceWorker>) -> Result<()> {
        let _cycle = self.cycle.lock().await;

        if let Err(e) = worker.install().await {
            error!(namespace = %worker.namespace(), error = %e, "registration failed, keeping current worker");
            return Err(e);
        }

        let previous = self.waiting.write().await.replace(worker);
        if let Some(previous) = previous {
            previous.retire().await;
        }

        self.promote_if_ready().await;
        Ok(())
    }

    // == Control Channel ==
    /// Delivers a control message to the waiting worker, then re-checks promotion.
    pub async fn post_message(&self, raw: &Value) {
        let _cycle = self.cycle.lock().await;

        match self.waiting().await {
            Some(worker) => {
                if worker.post_message(raw).is_some() {
                    self.promote_if_ready().await;
                }
            }
            None => info!(message = %raw, "no waiting worker, message ignored"),
        }
    }

    // == Clients ==
    /// Attaches a client context; it is controlled by the active worker, if any.
    pub async fn connect_client(&self, id: &str) {
        let controller = self.active().await.map(|w| w.namespace().id());
        self.clients.write().await.insert(id.to_string(), controller);
    }

    /// Detaches a client context, which may unblock a waiting worker.
    pub async fn disconnect_client(&self, id: &str) {
        let _cycle = self.cycle.lock().await;
        self.clients.write().await.remove(id);
        self.promote_if_ready().await;
    }

    /// Namespace of the worker controlling a client.
    pub async fn controller_of(&self, id: &str) -> Option<String> {
        self.clients.read().await.get(id).cloned().flatten()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    // == Promotion ==
    /// Promotes the waiting worker when it asked to skip waiting, when no
    /// worker is active, or when no client is controlled by the active worker.
    async fn promote_if_ready(&self) {
        let Some(waiting) = self.waiting().await else {
            return;
        };

        let active = self.active().await;
        let ready = match &active {
            None => true,
            Some(_) if waiting.wants_skip_waiting() => true,
            Some(current) => {
                let current = current.namespace().id();
                !self
                    .clients
                    .read()
                    .await
                    .values()
                    .any(|c| c.as_deref() == Some(current.as_str()))
            }
        };
        if !ready {
            info!(namespace = %waiting.namespace(), "waiting for clients of the current worker to close");
            return;
        }

        if let Err(e) = waiting.activate().await {
            warn!(namespace = %waiting.namespace(), error = %e, "activation failed");
            return;
        }

        *self.waiting.write().await = None;
        let previous = self.active.write().await.replace(waiting.clone());
        if let Some(previous) = previous {
            previous.retire().await;
        }

        self.claim(&waiting).await;
    }

    /// Takes control of every connected client.
    async fn claim(&self, worker: &ServiceWorker) {
        let namespace = worker.namespace().id();
        let mut clients = self.clients.write().await;
        for controller in clients.values_mut() {
            *controller = Some(namespace.clone());
        }
        info!(namespace = %namespace, clients = clients.len(), "claimed clients");
    }

    // == Fetch ==
    /// Routes a request through the active worker, or straight to the
    /// network when nothing intercepts it.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> CachedResponse {
        if let Some(worker) = self.active().await {
            if let Some(response) = worker.handle_fetch(request).await {
                return response;
            }
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = %request.cache_key(), error = %e, "passthrough failed");
                CachedResponse::new(502, "text/plain; charset=utf-8", "Bad gateway")
            }
        }
    }

    // == Status ==
    pub async fn status(&self) -> Result<StatusResponse> {
        let active = self.active().await;
        let waiting = self.waiting().await;

        let active_status = match &active {
            Some(w) => Some(WorkerStatus {
                namespace: w.namespace().id(),
                state: w.state().await,
            }),
            None => None,
        };
        let waiting_status = match &waiting {
            Some(w) => Some(WorkerStatus {
                namespace: w.namespace().id(),
                state: w.state().await,
            }),
            None => None,
        };

        let cache = self.store.stats().await;
        Ok(StatusResponse {
            active: active_status,
            waiting: waiting_status,
            namespaces: self.store.namespaces().await?,
            clients: self.client_count().await,
            hit_rate: cache.hit_rate(),
            cache,
            resolution: active.map(|w| w.stats()),
        })
    }
}
