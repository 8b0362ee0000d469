//! API error taxonomy.

use riskdash_domain::ValidationError;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by the REST services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any request was sent.
    #[error("{message}")]
    Validation {
        /// Offending field.
        field: String,
        /// Human-readable reason.
        message: String,
    },

    /// 400 or 422 from the backend.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 401: missing, expired or revoked token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403: authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409: e.g. a duplicate bank name.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the body, or the canonical reason.
        message: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// A response body did not match the expected schema.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Token storage could not be read or written.
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Maps a non-success status and its body to an error.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let message = error_message(body).unwrap_or_else(|| default_message(status));
        match status {
            400 | 422 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Server { status, message },
        }
    }

    /// Whether retrying the same request could succeed.
    ///
    /// Nothing in this crate retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Extracts the message from `{"error":{"message":..}}`, `{"message":..}`
/// or the JWT layer's `{"msg":..}`.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value
        .pointer("/error/message")
        .or_else(|| value.get("error").filter(|e| e.is_string()))
        .or_else(|| value.get("message"))
        .or_else(|| value.get("msg"))?;
    message.as_str().map(str::to_string)
}

fn default_message(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Request failed")
        .to_string()
}
