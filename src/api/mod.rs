//! API Module
//!
//! HTTP host for the worker: every request is offered to the active worker,
//! plus a small control surface.
//!
//! # Endpoints
//! - `POST /__worker/message` - Post a control message
//! - `POST|DELETE /__worker/clients/:id` - Attach or detach a client context
//! - `POST /__worker/versions/:version` - Install a new worker version
//! - `GET /__worker/status` - Worker and cache status
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
