//! Cache Entry Module
//!
//! Defines a stored response snapshot together with its insertion time.

use chrono::{DateTime, Utc};

use crate::models::CachedResponse;

// == Cache Entry ==
/// Represents a single cache entry: the response snapshot and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response
    pub response: CachedResponse,
    /// Insertion timestamp
    pub stored_at: DateTime<Utc>,
    /// Written by an install; never evicted to make room
    pub pinned: bool,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an evictable entry stamped with the current time.
    pub fn new(response: CachedResponse) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
            pinned: false,
        }
    }

    /// Creates an entry that eviction must skip.
    pub fn pinned(response: CachedResponse) -> Self {
        Self {
            pinned: true,
            ..Self::new(response)
        }
    }
}
