//! Relay-originated replies, built as safe JSON (never string-formatted).

use serde_json::json;

/// Registration confirmation, echoing the bound id.
pub fn registered_json(client_id: &str) -> String {
    json!({
        "type": "registered",
        "client_id": client_id
    })
    .to_string()
}

/// Error reply (protocol violation, supersession notice).
pub fn error_json(message: &str) -> String {
    json!({
        "type": "error",
        "message": message
    })
    .to_string()
}
