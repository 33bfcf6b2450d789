//! Cache Statistics Module
//!
//! Tracks cache store activity: hits, misses, writes, evictions and purged namespaces.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache store counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found an entry
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of entries written (single and bulk)
    pub writes: u64,
    /// Number of entries evicted to stay within quota
    pub evictions: u64,
    /// Number of namespaces deleted
    pub namespaces_deleted: u64,
    /// Current number of entries across all namespaces
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the lookup hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_writes(&mut self, count: usize) {
        self.writes += count as u64;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_namespace_deleted(&mut self) {
        self.namespaces_deleted += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
