//! Response envelope.

use serde::{Deserialize, Serialize};

/// Standard response wrapper: `{ "message"?: string, "body"?: {...} }`.
///
/// Errors carry only `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Human-readable status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A response with a payload and no message.
    pub fn ok(body: T) -> Self {
        Self {
            message: None,
            body: Some(body),
        }
    }

    /// A response with a payload and a message.
    pub fn with_message(message: impl Into<String>, body: T) -> Self {
        Self {
            message: Some(message.into()),
            body: Some(body),
        }
    }

    /// A response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            body: None,
        }
    }
}
