//! Request, response and message models for the offline cache worker
//!
//! This module defines the intercepted request, the stored response snapshot,
//! control channel messages and the DTOs serialized by the control surface.

pub mod messages;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use messages::ControlMessage;
pub use requests::{is_absolute_url, normalize_url, Destination, FetchRequest};
pub use responses::{CachedResponse, ClientResponse, HealthResponse, StatusResponse, WorkerStatus};
