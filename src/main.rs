//! Offline Cache - an offline-first cache worker
//!
//! Hosts the worker behind an HTTP front that forwards to the configured origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::api::{create_router, AppState};
use offline_cache::cache::{CacheStore, FileCacheStore, MemoryCacheStore};
use offline_cache::config::Config;
use offline_cache::tasks::spawn_registration_task;
use offline_cache::worker::{Fetcher, HttpFetcher, Registration, ServiceWorker};

/// Main entry point for the offline cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache store (persisted when `CACHE_DIR` is set) and the network fetcher
/// 4. Start worker registration in the background
/// 5. Create Axum router and serve on the configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offline cache host");

    let config = Config::from_env();
    info!(
        "Configuration loaded: namespace={}-{}, origin={}, port={}, eager_activation={}",
        config.app_name,
        config.cache_version,
        config.origin_url,
        config.server_port,
        config.eager_activation
    );

    let store: Arc<dyn CacheStore> = match &config.cache_dir {
        Some(dir) => Arc::new(
            FileCacheStore::load(dir.clone(), config.max_entries)
                .await
                .with_context(|| format!("failed to load cache directory {}", dir.display()))?,
        ),
        None => {
            warn!("CACHE_DIR not set, cache store is in memory only");
            Arc::new(MemoryCacheStore::new(config.max_entries))
        }
    };
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(&config.origin_url).context("failed to build HTTP client")?,
    );
    let state = AppState::new(
        Registration::new(store.clone(), fetcher.clone()),
        config.clone(),
    );

    // Registration never blocks serving; until it succeeds requests go to the network
    let worker_config = config.clone();
    let registration_handle = spawn_registration_task(
        state.registration.clone(),
        move || ServiceWorker::from_config(&worker_config, store.clone(), fetcher.clone()),
        config.register_attempts,
        config.register_retry_interval,
    );
    info!("Worker registration started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registration_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts a registration still in progress.
async fn shutdown_signal(registration_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if !registration_handle.is_finished() {
        registration_handle.abort();
        warn!("Worker registration aborted");
    }
}
