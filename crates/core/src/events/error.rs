use thiserror::Error;

/// Errors that can occur while publishing or consuming events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Queue connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Publish failed: {0}")]
    PublishFailed(String),
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;
