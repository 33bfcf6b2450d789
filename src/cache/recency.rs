//! Recency Tracker Module
//!
//! Tracks insertion recency of the keys in one namespace.

use std::collections::VecDeque;

// == Recency Tracker ==
/// Tracks keys in the order they were last written.
///
/// - Front = least recently written
/// - Back = most recently written
#[derive(Debug, Default)]
pub struct RecencyTracker {
    /// Keys ordered by write time
    order: VecDeque<String>,
}

impl RecencyTracker {
    // == Touch ==
    /// Marks a key as just written (moves it to the back).
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Keys ==
    /// Iterates keys, least recently written first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns all keys, least recently written first.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }
}
