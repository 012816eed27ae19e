//! Routed signaling envelope (JSON).
//!
//! The relay only understands three fields: `type`, `target_id`, and `from`.
//! Everything else (SDP blobs, ICE candidates, application extras) is carried
//! in a flattened map and forwarded untouched. The map cannot be a lazy
//! `RawValue` because the router mutates the envelope (`from` stamp) and
//! re-serializes it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// Message type consumed by the relay during the registration handshake.
pub const MSG_REGISTER: &str = "register";
/// Confirmation sent by the relay after a successful registration.
pub const MSG_REGISTERED: &str = "registered";
/// Error reply originated by the relay.
pub const MSG_ERROR: &str = "error";

/// One signaling message as it crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type (field name is `type` in JSON). Opaque to routing except
    /// for the literal `"register"`.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Unicast target. Absent or empty means broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Sender id, stamped by the router. Any client-supplied value is
    /// overwritten before forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Opaque payload, forwarded unmodified.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Parse one wire frame.
    pub fn parse(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| RelayError::BadMessage(format!("invalid json: {e}")))
    }

    /// Serialize back to a wire frame.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RelayError::BadMessage(format!("json encode failed: {e}")))
    }

    pub fn is_register(&self) -> bool {
        self.msg_type == MSG_REGISTER
    }

    /// `client_id` out of the payload (registration handshake only).
    pub fn client_id(&self) -> Option<&str> {
        self.payload.get("client_id").and_then(Value::as_str)
    }

    /// Unicast target, if one is named. Empty strings count as broadcast.
    pub fn unicast_target(&self) -> Option<&str> {
        self.target_id.as_deref().filter(|t| !t.is_empty())
    }
}
