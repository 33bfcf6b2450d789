//! API Routes
//!
//! Configures the Axum router for the worker host.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    connect_client_handler, disconnect_client_handler, fetch_handler, health_handler,
    message_handler, register_version_handler, status_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /__worker/message` - Control channel
/// - `POST /__worker/clients/:id` - Attach a client context
/// - `DELETE /__worker/clients/:id` - Detach a client context
/// - `POST /__worker/versions/:version` - Install a new worker version
/// - `GET /__worker/status` - Worker and cache status
/// - `GET /health` - Health check endpoint
/// - anything else - Intercepted by the active worker
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/__worker/message", post(message_handler))
        .route(
            "/__worker/clients/:id",
            post(connect_client_handler).delete(disconnect_client_handler),
        )
        .route("/__worker/versions/:version", post(register_version_handler))
        .route("/__worker/status", get(status_handler))
        .route("/health", get(health_handler))
        .fallback(fetch_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
