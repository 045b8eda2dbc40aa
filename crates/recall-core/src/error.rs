//! Error types for recall.

use thiserror::Error;

/// Result type alias using recall's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recall operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Caller input rejected before any external call (empty question,
    /// malformed filters). Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The text-completion provider returned nothing usable as a query plan
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    /// The text-completion provider returned nothing usable as an answer
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Embedding provider call failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A query embedding violated the engine's invariants (wrong dimension,
    /// non-finite values). Always a bug signal, never expected in operation.
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
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
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("question is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: question is empty");
    }

    #[test]
    fn test_error_display_planning_failed() {
        let err = Error::PlanningFailed("unparsable response".to_string());
        assert_eq!(err.to_string(), "Planning failed: unparsable response");
    }

    #[test]
    fn test_error_display_synthesis_failed() {
        let err = Error::SynthesisFailed("provider timeout".to_string());
        assert_eq!(err.to_string(), "Synthesis failed: provider timeout");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("connection refused".to_string());
        assert_eq!(err.to_string(), "Embedding error: connection refused");
    }

    #[test]
    fn test_error_display_invalid_embedding() {
        let err = Error::InvalidEmbedding("expected 768 dims, got 3".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid embedding: expected 768 dims, got 3"
        );
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
