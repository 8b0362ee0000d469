//! Validation errors raised before a request ever leaves the client.

/// A field failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending field name (wire name).
    pub field: String,
    /// Human readable message, matching the backend's wording.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Error for a missing required field.
    pub fn missing(field: &str) -> Self {
        Self::new(field, format!("Missing required field: {field}"))
    }
}
