//! Worker Registration Task
//!
//! Background task that installs and activates the configured worker without
//! blocking the host server.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::worker::{Registration, ServiceWorker};

/// Spawns a task that registers a worker, retrying failed installs.
///
/// A failed install retires its worker, so `make_worker` builds a fresh one
/// for every attempt. Failures are only logged; the previous active worker
/// (if any) keeps serving throughout.
///
/// # Arguments
/// * `registration` - Registration the worker is installed into
/// * `make_worker` - Builds the worker version to install
/// * `attempts` - Maximum number of install attempts (at least one is made)
/// * `retry_interval_secs` - Delay in seconds between attempts
///
/// # Example
/// ```ignore
/// let handle = spawn_registration_task(registration, move || {
///     ServiceWorker::from_config(&config, store.clone(), fetcher.clone())
/// }, 3, 30);
/// ```
pub fn spawn_registration_task<F>(
    registration: Arc<Registration>,
    make_worker: F,
    attempts: u32,
    retry_interval_secs: u64,
) -> JoinHandle<()>
where
    F: Fn() -> ServiceWorker + Send + 'static,
{
    let interval = Duration::from_secs(retry_interval_secs);
    let attempts = attempts.max(1);

    tokio::spawn(async move {
        for attempt in 1..=attempts {
            let worker = Arc::new(make_worker());
            let namespace = worker.namespace().id();

            match registration.register(worker).await {
                Ok(()) => {
                    info!(namespace = %namespace, attempt, "worker registered");
                    return;
                }
                Err(e) => {
                    warn!(namespace = %namespace, attempt, attempts, error = %e, "worker registration failed");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        warn!("giving up on worker registration; requests go straight to the network");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheNamespace, CacheStore, MemoryCacheStore};
    use crate::worker::manifest::Manifest;
    use crate::worker::test_support::MockFetcher;
    use crate::worker::LifecycleState;

    fn make_worker(
        store: Arc<MemoryCacheStore>,
        fetcher: Arc<MockFetcher>,
    ) -> impl Fn() -> ServiceWorker + Send + 'static {
        move || {
            ServiceWorker::new(
                CacheNamespace::new("notes", "v1"),
                Manifest::bundled(),
                store.clone(),
                fetcher.clone(),
                "/",
                true,
            )
        }
    }

    #[tokio::test]
    async fn test_registration_task_activates_worker() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let registration = Arc::new(Registration::new(store.clone(), fetcher.clone()));

        let handle = spawn_registration_task(
            registration.clone(),
            make_worker(store.clone(), fetcher),
            1,
            1,
        );
        handle.await.unwrap();

        let active = registration.active().await.expect("worker should be active");
        assert_eq!(active.state().await, LifecycleState::Active);
        assert_eq!(store.namespaces().await.unwrap(), vec!["notes-v1"]);
    }

    #[tokio::test]
    async fn test_registration_task_retries_after_failure() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        fetcher.set_offline(true);
        let registration = Arc::new(Registration::new(store.clone(), fetcher.clone()));

        let handle = spawn_registration_task(
            registration.clone(),
            make_worker(store, fetcher.clone()),
            3,
            1,
        );

        // First attempt fails while offline; come back online before the retry
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(registration.active().await.is_none());
        fetcher.set_offline(false);

        handle.await.unwrap();
        assert!(registration.active().await.is_some());
    }

    #[tokio::test]
    async fn test_registration_task_gives_up() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::offline());
        let registration = Arc::new(Registration::new(store.clone(), fetcher.clone()));

        let handle = spawn_registration_task(
            registration.clone(),
            make_worker(store, fetcher.clone()),
            2,
            0,
        );
        handle.await.unwrap();

        assert!(registration.active().await.is_none());
        // One manifest fetch per attempt before the install aborts
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_registration_task_can_be_aborted() {
        let store = Arc::new(MemoryCacheStore::new(100));
        let fetcher = Arc::new(MockFetcher::offline());
        let registration = Arc::new(Registration::new(store.clone(), fetcher.clone()));

        let handle = spawn_registration_task(registration, make_worker(store, fetcher), 10, 60);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
