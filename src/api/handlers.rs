//! API Handlers
//!
//! HTTP request handlers for the worker host: the intercepting proxy and the
//! control surface.

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ClientResponse, Destination, FetchRequest, HealthResponse, StatusResponse};
use crate::worker::{Registration, ServiceWorker};

/// Largest request body forwarded on passthrough.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration hosting the worker versions
    pub registration: Arc<Registration>,
    /// Worker settings new versions are built from
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around a registration.
    pub fn new(registration: Registration, config: Config) -> Self {
        Self {
            registration: Arc::new(registration),
            config: Arc::new(config),
        }
    }
}

/// Fallback handler: every request not addressed to the control surface.
///
/// The request is handed to the active worker; with none, or when the worker
/// does not intercept it, it goes to the network.
pub async fn fetch_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let destination = Destination::from_headers(&parts.method, &parts.headers);
    let fetch_request = FetchRequest::new(parts.method.clone(), url)
        .with_destination(destination)
        .with_parts(parts.headers, body);

    state
        .registration
        .handle_fetch(&fetch_request)
        .await
        .into_response()
}

/// Handler for POST /__worker/message
///
/// Fire-and-forget control channel; unknown messages are ignored.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<Value>,
) -> StatusCode {
    state.registration.post_message(&message).await;
    StatusCode::NO_CONTENT
}

/// Handler for POST /__worker/clients/:id
///
/// Attaches a client context; it is controlled by the active worker, if any.
pub async fn connect_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ClientResponse> {
    state.registration.connect_client(&id).await;
    let controller = state.registration.controller_of(&id).await;
    Json(ClientResponse { id, controller })
}

/// Handler for DELETE /__worker/clients/:id
///
/// Detaching the last client of the active worker lets a waiting worker take over.
pub async fn disconnect_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.registration.disconnect_client(&id).await;
    StatusCode::NO_CONTENT
}

/// Handler for POST /__worker/versions/:version
///
/// Installs a new version of the worker with the bundled manifest. The new
/// version activates right away or waits, following the promotion rules.
pub async fn register_version_handler(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<Json<StatusResponse>> {
    let config = Config {
        cache_version: version,
        ..(*state.config).clone()
    };
    let worker = ServiceWorker::from_config(
        &config,
        state.registration.store(),
        state.registration.fetcher(),
    );

    state.registration.register(Arc::new(worker)).await?;
    let status = state.registration.status().await?;
    Ok(Json(status))
}

/// Handler for GET /__worker/status
pub async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let status = state.registration.status().await?;
    Ok(Json(status))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::worker::test_support::MockFetcher;
    use crate::worker::{LifecycleState, Manifest};
    use serde_json::json;

    async fn state_with_worker() -> AppState {
        let fetcher = Arc::new(MockFetcher::serving_manifest(&Manifest::bundled()));
        let store = Arc::new(MemoryCacheStore::new(100));
        let state = AppState::new(
            Registration::new(store.clone(), fetcher.clone()),
            Config::default(),
        );
        let worker = ServiceWorker::from_config(&Config::default(), store, fetcher);
        state.registration.register(Arc::new(worker)).await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_status_handler() {
        let state = state_with_worker().await;

        let response = status_handler(State(state)).await.unwrap();
        assert_eq!(response.active.as_ref().unwrap().namespace, "notes-v1");
        assert_eq!(response.namespaces, vec!["notes-v1"]);
    }

    #[tokio::test]
    async fn test_message_handler_accepts_anything() {
        let state = state_with_worker().await;

        let status = message_handler(State(state.clone()), Json(json!({"type": "SKIP_WAITING"}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let status = message_handler(State(state), Json(json!({"hello": "world"}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_client_attach_and_detach() {
        let state = state_with_worker().await;

        let Json(client) =
            connect_client_handler(State(state.clone()), Path("tab-1".to_string())).await;
        assert_eq!(client.id, "tab-1");
        assert_eq!(client.controller.as_deref(), Some("notes-v1"));
        assert_eq!(state.registration.client_count().await, 1);

        let status =
            disconnect_client_handler(State(state.clone()), Path("tab-1".to_string())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.registration.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_version_handler() {
        let state = state_with_worker().await;

        let Json(status) = register_version_handler(State(state.clone()), Path("v2".to_string()))
            .await
            .unwrap();

        let active = status.active.unwrap();
        assert_eq!(active.namespace, "notes-v2");
        assert_eq!(active.state, LifecycleState::Active);
        assert_eq!(status.namespaces, vec!["notes-v2"]);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
