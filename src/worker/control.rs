//! Control Channel
//!
//! Messages posted by the hosting application to a worker.

use serde_json::Value;
use tracing::{debug, info};

use crate::models::ControlMessage;
use crate::worker::lifecycle::LifecycleController;

/// Applies a raw control message to a worker's lifecycle.
///
/// Returns the command that was applied. Unrecognized messages are ignored.
pub fn dispatch(lifecycle: &LifecycleController, raw: &Value) -> Option<ControlMessage> {
    let Some(message) = ControlMessage::parse(raw) else {
        debug!(message = %raw, "ignoring unrecognized control message");
        return None;
    };

    match message {
        ControlMessage::SkipWaiting => {
            info!(namespace = %lifecycle.namespace(), "skip waiting requested");
            lifecycle.skip_waiting();
        }
    }
    Some(message)
}
