//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Worker and host configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name, the first half of every cache namespace
    pub app_name: String,
    /// Deployed cache version, the second half of the namespace
    pub cache_version: String,
    /// Upstream origin that network fetches are forwarded to
    pub origin_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Promote a freshly installed worker without waiting for clients to close
    pub eager_activation: bool,
    /// Cached document served when a navigation cannot be resolved
    pub fallback_document: String,
    /// Maximum number of entries one cache namespace can hold
    pub max_entries: usize,
    /// Directory the cache store persists to; in memory only when unset
    pub cache_dir: Option<PathBuf>,
    /// Install attempts made by the registration task
    pub register_attempts: u32,
    /// Delay in seconds between install attempts
    pub register_retry_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_NAME` - Application name (default: notes)
    /// - `CACHE_VERSION` - Cache version (default: v1)
    /// - `ORIGIN_URL` - Upstream origin (default: http://127.0.0.1:8080)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `EAGER_ACTIVATION` - Skip the waiting phase on install (default: true)
    /// - `FALLBACK_DOCUMENT` - Offline navigation fallback (default: /)
    /// - `MAX_ENTRIES` - Per-namespace quota in entries (default: 1000)
    /// - `CACHE_DIR` - Persist the cache store here (default: unset, in memory)
    /// - `REGISTER_ATTEMPTS` - Install attempts at startup (default: 3)
    /// - `REGISTER_RETRY_INTERVAL` - Seconds between attempts (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: env::var("APP_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.app_name),
            cache_version: env::var("CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cache_version),
            origin_url: env::var("ORIGIN_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.origin_url),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            eager_activation: env::var("EAGER_ACTIVATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.eager_activation),
            fallback_document: env::var("FALLBACK_DOCUMENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.fallback_document),
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or(defaults.cache_dir),
            register_attempts: env::var("REGISTER_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.register_attempts),
            register_retry_interval: env::var("REGISTER_RETRY_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.register_retry_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "notes".to_string(),
            cache_version: "v1".to_string(),
            origin_url: "http://127.0.0.1:8080".to_string(),
            server_port: 3000,
            eager_activation: true,
            fallback_document: "/".to_string(),
            max_entries: 1000,
            cache_dir: None,
            register_attempts: 3,
            register_retry_interval: 30,
        }
    }
}
