//! Request Router
//!
//! Pure classification of intercepted requests.

use crate::models::{Destination, FetchRequest};

/// How an intercepted request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted: goes to the network untouched
    Passthrough,
    /// Top-level navigation, resolved by the document policy
    Document,
    /// Any other same-origin GET, resolved by the asset policy
    Asset,
}

/// Classifies a request.
///
/// Non-GET requests and cross-origin (absolute) URLs pass through. The result
/// depends only on the method, URL and destination.
pub fn classify(request: &FetchRequest) -> Route {
    if !request.is_get() || request.is_cross_origin() {
        return Route::Passthrough;
    }
    match request.destination {
        Destination::Document => Route::Document,
        _ => Route::Asset,
    }
}
