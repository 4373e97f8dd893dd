//! Failure normalization
//!
//! Maps raw failures onto [`NormalizedError`]. The message is picked in this
//! order, and the order is what users end up reading:
//! 1. `detail` field of a JSON body
//! 2. `message` field of a JSON body
//! 3. the raw body text
//! 4. `Request failed: <status>`
//! 5. `connection failed` when no response arrived at all

use super::NormalizedError;
use serde_json::Value;

/// Message shown when no response reached the client
pub const CONNECTION_FAILED: &str = "connection failed";

const PRIMARY_MESSAGE_FIELD: &str = "detail";
const FALLBACK_MESSAGE_FIELD: &str = "message";

/// A failure as observed at the network boundary, before classification
#[derive(Debug, Clone)]
pub enum RawFailure {
    /// No response: DNS, connection refused, timeout, broken body stream
    Network { detail: String },
    /// Non-success status with whatever body came back
    Status { status: u16, body: String },
}

/// Turn a raw failure into the single error shape callers see
#[must_use]
pub fn normalize(failure: RawFailure) -> NormalizedError {
    match failure {
        RawFailure::Network { .. } => NormalizedError::network(CONNECTION_FAILED),
        RawFailure::Status { status, body } => {
            NormalizedError::http_status(status, status_message(status, &body))
        }
    }
}

fn status_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for field in [PRIMARY_MESSAGE_FIELD, FALLBACK_MESSAGE_FIELD] {
            if let Some(message) = fields.get(field).and_then(message_from_value) {
                return message;
            }
        }
    }

    if !body.trim().is_empty() {
        return body.to_string();
    }

    format!("Request failed: {status}")
}

/// Extract text from a message field.
///
/// Accepts a plain string, or a validation list of `{ "msg": ... }` entries.
fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .filter(|msg| !msg.trim().is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}
