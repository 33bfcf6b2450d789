//! File Cache Store Module
//!
//! Durable cache store: every namespace lives in one JSON file under the
//! cache directory and is loaded back on startup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, MemoryCacheStore};
use crate::error::{Result, WorkerError};
use crate::models::{CachedResponse, FetchRequest};

/// On-disk form of one namespace.
#[derive(Debug, Serialize, Deserialize)]
struct NamespaceFile {
    namespace: String,
    /// Entries, least recently written first
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    stored_at: DateTime<Utc>,
    pinned: bool,
}

impl StoredEntry {
    fn from_entry(key: String, entry: CacheEntry) -> Self {
        Self {
            key,
            status: entry.response.status,
            headers: entry.response.headers,
            body: entry.response.body.to_vec(),
            stored_at: entry.stored_at,
            pinned: entry.pinned,
        }
    }

    fn into_entry(self) -> (String, CacheEntry) {
        let entry = CacheEntry {
            response: CachedResponse {
                status: self.status,
                headers: self.headers,
                body: self.body.into(),
            },
            stored_at: self.stored_at,
            pinned: self.pinned,
        };
        (self.key, entry)
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> WorkerError {
    WorkerError::Storage(format!("failed to {} {}: {}", action, path.display(), e))
}

async fn read_namespace(path: &Path) -> Result<NamespaceFile> {
    let contents = fs::read(path).await.map_err(|e| io_error("read", path, e))?;
    serde_json::from_slice(&contents)
        .map_err(|e| WorkerError::Storage(format!("failed to parse {}: {}", path.display(), e)))
}

// == File Cache Store ==
/// Cache store persisted to a directory.
///
/// Reads are served from memory; every write is flushed to the namespace's
/// file before it returns. A write that cannot be persisted is undone.
#[derive(Debug)]
pub struct FileCacheStore {
    memory: MemoryCacheStore,
    dir: PathBuf,
    /// Serializes write-then-persist so files follow memory in order
    io: Mutex<()>,
}

impl FileCacheStore {
    // == Constructor ==
    /// Opens the cache directory, creating it if needed, and loads every
    /// namespace file found in it.
    ///
    /// Unreadable files are skipped with a warning.
    pub async fn load(dir: impl Into<PathBuf>, max_entries: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create", &dir, e))?;

        let memory = MemoryCacheStore::new(max_entries);
        let mut files = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error("list", &dir, e))?;
        let mut loaded = 0;
        while let Some(file) = files
            .next_entry()
            .await
            .map_err(|e| io_error("list", &dir, e))?
        {
            let path = file.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_namespace(&path).await {
                Ok(stored) => {
                    let entries = stored
                        .entries
                        .into_iter()
                        .map(StoredEntry::into_entry)
                        .collect();
                    memory.restore(&stored.namespace, entries).await;
                    loaded += 1;
                }
                Err(e) => warn!(error = %e, "skipping unreadable namespace file"),
            }
        }

        info!(dir = %dir.display(), namespaces = loaded, "cache directory loaded");
        Ok(Self {
            memory,
            dir,
            io: Mutex::new(()),
        })
    }

    fn namespace_path(&self, namespace: &str) -> Result<PathBuf> {
        let valid = !namespace.is_empty()
            && !namespace.starts_with('.')
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(WorkerError::Storage(format!(
                "invalid namespace name {:?}",
                namespace
            )));
        }
        Ok(self.dir.join(format!("{}.json", namespace)))
    }

    // == Persist ==
    /// Replaces the namespace's file with its current contents.
    ///
    /// Writes a temporary file and renames it over the old one.
    async fn persist(&self, namespace: &str) -> Result<()> {
        let path = self.namespace_path(namespace)?;
        let Some(entries) = self.memory.snapshot(namespace).await else {
            return Ok(());
        };

        let file = NamespaceFile {
            namespace: namespace.to_string(),
            entries: entries
                .into_iter()
                .map(|(key, entry)| StoredEntry::from_entry(key, entry))
                .collect(),
        };
        let contents = serde_json::to_vec(&file)
            .map_err(|e| WorkerError::Storage(format!("failed to encode {}: {}", namespace, e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| io_error("write", &tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error("replace", &path, e))?;

        debug!(namespace, path = %path.display(), "namespace persisted");
        Ok(())
    }

    /// Persists a namespace after a write, restoring `before` when that fails.
    async fn commit(&self, namespace: &str, before: Vec<(String, CacheEntry)>) -> Result<()> {
        if let Err(e) = self.persist(namespace).await {
            warn!(namespace, error = %e, "persist failed, write undone");
            self.memory.restore(namespace, before).await;
            return Err(e);
        }
        Ok(())
    }

    async fn existing(&self, namespace: &str) -> Result<Vec<(String, CacheEntry)>> {
        self.memory
            .snapshot(namespace)
            .await
            .ok_or_else(|| WorkerError::NamespaceNotFound(namespace.to_string()))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn open(&self, namespace: &str) -> Result<()> {
        self.namespace_path(namespace)?;
        let _io = self.io.lock().await;

        let created = self.memory.snapshot(namespace).await.is_none();
        self.memory.open(namespace).await?;
        if created {
            if let Err(e) = self.persist(namespace).await {
                self.memory.delete(namespace).await?;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn put_all(
        &self,
        namespace: &str,
        entries: Vec<(FetchRequest, CachedResponse)>,
    ) -> Result<()> {
        let _io = self.io.lock().await;
        let before = self.existing(namespace).await?;
        self.memory.put_all(namespace, entries).await?;
        self.commit(namespace, before).await
    }

    async fn lookup(
        &self,
        namespace: &str,
        request: &FetchRequest,
    ) -> Result<Option<CachedResponse>> {
        self.memory.lookup(namespace, request).await
    }

    async fn put(
        &self,
        namespace: &str,
        request: &FetchRequest,
        response: CachedResponse,
    ) -> Result<()> {
        let _io = self.io.lock().await;
        let before = self.existing(namespace).await?;
        self.memory.put(namespace, request, response).await?;
        self.commit(namespace, before).await
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        self.memory.keys(namespace).await
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        self.memory.namespaces().await
    }

    async fn delete(&self, namespace: &str) -> Result<bool> {
        let _io = self.io.lock().await;
        if self.memory.snapshot(namespace).await.is_none() {
            return Ok(false);
        }

        // File first: a namespace that is still on disk must stay visible
        let path = self.namespace_path(namespace)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error("remove", &path, e)),
        }
        self.memory.delete(namespace).await
    }

    async fn stats(&self) -> CacheStats {
        self.memory.stats().await
    }
}
