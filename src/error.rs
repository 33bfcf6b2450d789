//! Error types for the offline cache worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Worker Error Enum ==
/// Unified error type for the worker and its cache store.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Namespace does not exist in the cache store
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Cache storage could not be opened, read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Request method is not cacheable (only GET enters the store)
    #[error("Request is not cacheable: {0}")]
    NotCacheable(String),

    /// Network fetch was rejected before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// Network answered with a status outside the 2xx range
    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Manifest population failed; the install was aborted
    #[error("Install failed for {namespace}: {reason}")]
    InstallFailed { namespace: String, reason: String },

    /// Lifecycle transition requested from the wrong state
    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::NamespaceNotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::NotCacheable(_) => StatusCode::BAD_REQUEST,
            WorkerError::Network(_) | WorkerError::UnexpectedStatus { .. } => {
                StatusCode::BAD_GATEWAY
            }
            WorkerError::InvalidTransition(_) => StatusCode::CONFLICT,
            WorkerError::Storage(_) | WorkerError::InstallFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
