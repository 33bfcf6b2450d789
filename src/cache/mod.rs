//! Cache Module
//!
//! Provides the namespaced response store the worker populates and reads,
//! in memory or persisted to a cache directory.

mod entry;
mod file_store;
mod namespace;
mod recency;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use file_store::FileCacheStore;
pub use namespace::CacheNamespace;
pub use recency::RecencyTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, MemoryCacheStore};
