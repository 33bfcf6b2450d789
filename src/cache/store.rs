//! Cache Store Module
//!
//! The namespaced request→response store consumed by the worker, and an
//! in-memory implementation of it.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, RecencyTracker};
use crate::error::{Result, WorkerError};
use crate::models::{CachedResponse, FetchRequest};

// == Cache Store Trait ==
/// Durable namespaced key→response mapping addressed by request identity.
///
/// Only GET requests may be written or looked up; implementations reject
/// anything else with [`WorkerError::NotCacheable`]. Writes to the same key
/// are last-write-wins. Only [`CacheStore::open`] creates a namespace; writes
/// to a namespace that does not exist fail with
/// [`WorkerError::NamespaceNotFound`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Opens a namespace, creating it if absent.
    async fn open(&self, namespace: &str) -> Result<()>;

    /// Writes every entry into the namespace, or none of them.
    ///
    /// Entries written this way are pinned: eviction never removes them.
    async fn put_all(
        &self,
        namespace: &str,
        entries: Vec<(FetchRequest, CachedResponse)>,
    ) -> Result<()>;

    /// Looks up a request in a namespace.
    async fn lookup(&self, namespace: &str, request: &FetchRequest)
        -> Result<Option<CachedResponse>>;

    /// Writes a single entry.
    ///
    /// When the namespace is full, its least recently written unpinned
    /// entries are evicted to make room.
    async fn put(
        &self,
        namespace: &str,
        request: &FetchRequest,
        response: CachedResponse,
    ) -> Result<()>;

    /// Lists the keys of a namespace, least recently written first.
    async fn keys(&self, namespace: &str) -> Result<Vec<String>>;

    /// Lists every namespace.
    async fn namespaces(&self) -> Result<Vec<String>>;

    /// Deletes a namespace. Returns false if it did not exist.
    async fn delete(&self, namespace: &str) -> Result<bool>;

    /// Returns current store statistics.
    async fn stats(&self) -> CacheStats;
}

// == Namespace Partition ==
#[derive(Debug, Default)]
struct Partition {
    entries: HashMap<String, CacheEntry>,
    recency: RecencyTracker,
}

impl Partition {
    fn insert(&mut self, key: String, entry: CacheEntry) {
        self.recency.touch(&key);
        self.entries.insert(key, entry);
    }

    fn remove(&mut self, key: &str) {
        self.recency.remove(key);
        self.entries.remove(key);
    }

    /// Picks the entries to evict so that `incoming` fits in `max_entries`.
    ///
    /// Keys being written and pinned entries are never picked. Returns `None`
    /// when there is not enough evictable room.
    fn eviction_plan(&self, incoming: &[String], max_entries: usize) -> Option<Vec<String>> {
        let incoming: HashSet<&str> = incoming.iter().map(String::as_str).collect();
        let new_keys = incoming
            .iter()
            .filter(|k| !self.entries.contains_key(**k))
            .count();
        let needed = self.entries.len() + new_keys;
        if needed <= max_entries {
            return Some(Vec::new());
        }

        let excess = needed - max_entries;
        let victims: Vec<String> = self
            .recency
            .iter()
            .filter(|k| !incoming.contains(k))
            .filter(|k| self.entries.get(*k).map(|e| !e.pinned).unwrap_or(false))
            .take(excess)
            .map(str::to_string)
            .collect();

        (victims.len() == excess).then_some(victims)
    }
}

#[derive(Debug, Default)]
struct Inner {
    partitions: BTreeMap<String, Partition>,
    stats: CacheStats,
}

impl Inner {
    fn total_entries(&self) -> usize {
        self.partitions.values().map(|p| p.entries.len()).sum()
    }

    /// Writes entries into an existing partition, evicting as needed.
    ///
    /// Nothing is changed when the write cannot fit.
    fn write(
        &mut self,
        namespace: &str,
        entries: Vec<(String, CacheEntry)>,
        max_entries: usize,
    ) -> Result<()> {
        let partition = self
            .partitions
            .get_mut(namespace)
            .ok_or_else(|| WorkerError::NamespaceNotFound(namespace.to_string()))?;

        let keys: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();
        let victims = partition.eviction_plan(&keys, max_entries).ok_or_else(|| {
            WorkerError::Storage(format!(
                "quota of {} entries exceeded writing to {}",
                max_entries, namespace
            ))
        })?;

        for key in &victims {
            partition.remove(key);
        }
        let count = entries.len();
        for (key, entry) in entries {
            partition.insert(key, entry);
        }

        if !victims.is_empty() {
            debug!(namespace, evicted = victims.len(), "evicted least recently written entries");
            self.stats.record_evictions(victims.len());
        }
        self.stats.record_writes(count);
        let total = self.total_entries();
        self.stats.set_total_entries(total);
        Ok(())
    }
}

// == Memory Cache Store ==
/// In-memory cache store with a per-namespace entry quota.
#[derive(Debug)]
pub struct MemoryCacheStore {
    inner: RwLock<Inner>,
    /// Maximum number of entries one namespace can hold
    max_entries: usize,
}

impl MemoryCacheStore {
    // == Constructor ==
    /// Creates an empty store whose namespaces hold at most `max_entries` entries each.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_entries,
        }
    }

    fn check_method(request: &FetchRequest) -> Result<()> {
        if request.is_get() {
            Ok(())
        } else {
            Err(WorkerError::NotCacheable(request.cache_key()))
        }
    }

    // == Persistence Hooks ==
    /// Entries of a namespace in write order, or `None` if it does not exist.
    pub(crate) async fn snapshot(&self, namespace: &str) -> Option<Vec<(String, CacheEntry)>> {
        let inner = self.inner.read().await;
        inner.partitions.get(namespace).map(|partition| {
            partition
                .recency
                .iter()
                .filter_map(|key| {
                    partition
                        .entries
                        .get(key)
                        .map(|entry| (key.to_string(), entry.clone()))
                })
                .collect()
        })
    }

    /// Installs a namespace with previously stored entries, in write order.
    ///
    /// Bypasses the quota and write counters.
    pub(crate) async fn restore(&self, namespace: &str, entries: Vec<(String, CacheEntry)>) {
        let mut partition = Partition::default();
        for (key, entry) in entries {
            partition.insert(key, entry);
        }

        let mut inner = self.inner.write().await;
        inner.partitions.insert(namespace.to_string(), partition);
        let total = inner.total_entries();
        inner.stats.set_total_entries(total);
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, namespace: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.partitions.entry(namespace.to_string()).or_default();
        Ok(())
    }

    async fn put_all(
        &self,
        namespace: &str,
        entries: Vec<(FetchRequest, CachedResponse)>,
    ) -> Result<()> {
        // Validate everything before touching the partition
        for (request, _) in &entries {
            Self::check_method(request)?;
        }
        let entries: Vec<(String, CacheEntry)> = entries
            .into_iter()
            .map(|(request, response)| (request.cache_key(), CacheEntry::pinned(response)))
            .collect();
        let count = entries.len();

        let mut inner = self.inner.write().await;
        inner.write(namespace, entries, self.max_entries)?;
        debug!(namespace, count, "bulk write complete");
        Ok(())
    }

    async fn lookup(
        &self,
        namespace: &str,
        request: &FetchRequest,
    ) -> Result<Option<CachedResponse>> {
        Self::check_method(request)?;

        // Write lock: lookups update hit/miss counters
        let mut inner = self.inner.write().await;
        let found = inner
            .partitions
            .get(namespace)
            .and_then(|p| p.entries.get(&request.cache_key()))
            .map(|entry| entry.response.clone());

        match found {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        Ok(found)
    }

    async fn put(
        &self,
        namespace: &str,
        request: &FetchRequest,
        response: CachedResponse,
    ) -> Result<()> {
        Self::check_method(request)?;
        let entry = (request.cache_key(), CacheEntry::new(response));

        let mut inner = self.inner.write().await;
        inner.write(namespace, vec![entry], self.max_entries)
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        inner
            .partitions
            .get(namespace)
            .map(|p| p.recency.keys())
            .ok_or_else(|| WorkerError::NamespaceNotFound(namespace.to_string()))
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.partitions.keys().cloned().collect())
    }

    async fn delete(&self, namespace: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.partitions.remove(namespace).is_some();
        if removed {
            inner.stats.record_namespace_deleted();
            let total = inner.total_entries();
            inner.stats.set_total_entries(total);
        }
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.total_entries());
        stats
    }
}
