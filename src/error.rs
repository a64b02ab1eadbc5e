//! Error types for a3s-runner

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur while running a session against the host
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Discovery provider failure (fatal at startup)
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// A step template with broken parameter delimiters
    #[error("Malformed step template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// Two different implementations claim the same normalized step
    #[error("Duplicate step implementation for '{key}'")]
    DuplicateStep { key: String },

    /// No implementation registered for a normalized step
    #[error("Step implementation not found: {0}")]
    StepNotFound(String),

    /// Could not connect to the host within the retry budget
    #[error("Connection error: {0}")]
    Connection(String),

    /// Frame-level failure (malformed length, truncated payload, I/O)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Raw socket failure outside of framing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The host closed the connection between frames
    #[error("Connection closed by host")]
    ConnectionClosed,

    /// Frame payload is not a valid message envelope
    #[error("Failed to decode message: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Envelope carries a message type tag this runner does not know
    #[error("Unknown message type: {0}")]
    UnknownMessageType(i32),

    /// Request arrived without the payload its type requires
    #[error("Message {message_type} is missing its '{field}' payload")]
    MissingPayload {
        message_type: String,
        field: &'static str,
    },

    /// The refactoring collaborator rejected or failed a request
    #[error("Refactor failed: {0}")]
    Refactor(String),

    /// A handler could not produce a response
    #[error("Handler for {message_type} failed: {reason}")]
    Handler {
        message_type: String,
        reason: String,
    },
}

impl RunnerError {
    /// Whether the connection is unusable after this error.
    ///
    /// Connection-fatal errors end the dispatch loop; everything else is
    /// scoped to a single message and the loop keeps going.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            RunnerError::Transport(_) | RunnerError::Io(_) | RunnerError::ConnectionClosed
        )
    }
}

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_fatal_classification() {
        assert!(RunnerError::ConnectionClosed.is_connection_fatal());
        assert!(RunnerError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
            .is_connection_fatal());
        assert!(
            RunnerError::Transport(TransportError::Malformed("bad varint".into()))
                .is_connection_fatal()
        );

        assert!(!RunnerError::UnknownMessageType(99).is_connection_fatal());
        assert!(!RunnerError::StepNotFound("a step".into()).is_connection_fatal());
        assert!(!RunnerError::Handler {
            message_type: "ExecuteStep".into(),
            reason: "boom".into(),
        }
        .is_connection_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = RunnerError::MalformedTemplate {
            template: "say \"hi".into(),
            reason: "unterminated quote".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed step template 'say \"hi': unterminated quote"
        );
        assert_eq!(
            RunnerError::DuplicateStep { key: "a {}".into() }.to_string(),
            "Duplicate step implementation for 'a {}'"
        );
    }
}
