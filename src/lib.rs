//! Offline Cache - an offline-first cache worker
//!
//! Keeps a fixed manifest of assets available offline in versioned cache
//! namespaces and resolves every intercepted request cache-first, with
//! synthesized fallbacks when both cache and network fail.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_registration_task;
