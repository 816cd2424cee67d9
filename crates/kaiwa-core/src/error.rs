//! Error types for kaiwa.

use thiserror::Error;

/// Result type alias using kaiwa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kaiwa operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No bound identity on the session/connection.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Identity present but lacks the capability (wrong role, not the author).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced message or record absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document or web augmentation source unreachable.
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// AI completion backend call failed.
    #[error("Completion failed: {0}")]
    CompletionFailed(String),

    /// Store write/read failure (wraps sqlx::Error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid input from a client.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RetrievalFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unauthenticated() {
        let err = Error::Unauthenticated("no session token".to_string());
        assert_eq!(err.to_string(), "Unauthenticated: no session token");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("admin role required".to_string());
        assert_eq!(err.to_string(), "Forbidden: admin role required");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("message".to_string());
        assert_eq!(err.to_string(), "Not found: message");
    }

    #[test]
    fn test_error_display_retrieval_failed() {
        let err = Error::RetrievalFailed("search backend 503".to_string());
        assert_eq!(err.to_string(), "Retrieval failed: search backend 503");
    }

    #[test]
    fn test_error_display_completion_failed() {
        let err = Error::CompletionFailed("backend timeout".to_string());
        assert_eq!(err.to_string(), "Completion failed: backend timeout");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
