use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache key not found: {0}")]
    NotFound(String),
    #[error("Cache key is locked: {0}")]
    Conflict(String),
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = CacheError::NotFound("guest:1".to_string());
        assert_eq!(error.to_string(), "Cache key not found: guest:1");
    }

    #[test]
    fn test_conflict_display() {
        let error = CacheError::Conflict("guest:lock".to_string());
        assert_eq!(error.to_string(), "Cache key is locked: guest:lock");
    }

    #[test]
    fn test_connection_failed_display() {
        let error = CacheError::ConnectionFailed("timeout".to_string());
        assert_eq!(error.to_string(), "Cache connection failed: timeout");
    }

    #[test]
    fn test_serialization_display() {
        let error = CacheError::Serialization("invalid JSON".to_string());
        assert_eq!(error.to_string(), "Serialization error: invalid JSON");
    }
}
