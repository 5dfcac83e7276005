//! Error types for MQTeam.

use thiserror::Error;

/// Common error type for MQTeam.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Local input validation failed (e.g. nickname length).
    #[error("validation error: {0}")]
    Validation(String),

    /// The admission service rejected the join or could not be reached.
    #[error("admission error: {0}")]
    Admission(String),

    /// Broker connect, subscribe or publish failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MQTeam operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ChatError::Validation("nickname too short".to_string());
        assert_eq!(err.to_string(), "validation error: nickname too short");
    }

    #[test]
    fn test_admission_error_display() {
        let err = ChatError::Admission("nickname is already in use".to_string());
        assert_eq!(
            err.to_string(),
            "admission error: nickname is already in use"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = ChatError::Transport("subscribe rejected".to_string());
        assert_eq!(err.to_string(), "transport error: subscribe rejected");
    }

    #[test]
    fn test_malformed_payload_display() {
        let err = ChatError::MalformedPayload("missing field `id`".to_string());
        assert_eq!(err.to_string(), "malformed payload: missing field `id`");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChatError = io_err.into();
        assert!(matches!(err, ChatError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
