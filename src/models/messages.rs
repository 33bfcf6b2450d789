//! Control channel messages
//!
//! Messages the hosting application posts to the worker.

use serde::Deserialize;
use serde_json::Value;

/// A command accepted by the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Promote the waiting worker to active now
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl ControlMessage {
    /// Parses a raw message.
    ///
    /// Returns `None` for anything that is not a known command; callers
    /// ignore those.
    pub fn parse(raw: &Value) -> Option<Self> {
        serde_json::from_value(raw.clone()).ok()
    }
}
