use thiserror::Error;

use crate::types::RequestStatus;

pub type Result<T, E = MarketError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    /// No connectivity, timeout or any other transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// A requested record is absent from the collection the backend returned.
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("chat request {request_id} is {status}; no further actions are accepted")]
    InvalidState {
        request_id: i64,
        status: RequestStatus,
    },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("unauthorized: session is no longer valid")]
    Unauthorized,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation {
            status: 400,
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP status and its body to the error taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => MarketError::Unauthorized,
            400..=499 => MarketError::Validation { status, message },
            _ => MarketError::Server { status, message },
        }
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MarketError::Decode(e.to_string())
        } else {
            MarketError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(e: serde_json::Error) -> Self {
        MarketError::Decode(e.to_string())
    }
}

/// Backends report failures as `{message}`, `{errorMessage}` or `{error}`.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "errorMessage", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}
