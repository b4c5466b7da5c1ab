//! Response envelope used by the `TermTask` backend.
//!
//! Successful responses wrap their payload in `{"data": ...}`; error
//! responses carry a human-readable `{"message": ...}`. Both fields are
//! optional so a missing or malformed body never fails envelope parsing.

use serde::{Deserialize, Serialize};

/// Generic `{data, message}` wrapper around a backend payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Payload of a successful response, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message, typically set on errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Wraps a payload in a success envelope.
    pub const fn of(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
        }
    }

    /// Builds a message-only envelope (error or informational).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Extracts the `message` field from a raw response body, if parseable.
///
/// Used for error surfacing: the body may be any shape (or not JSON at
/// all), in which case `None` is returned and the caller falls back to a
/// generic message.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(body).ok()?;
    envelope.message.filter(|m| !m.is_empty())
}
