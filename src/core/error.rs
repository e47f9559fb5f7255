use thiserror::Error;

/// Custom error types for overflow beacon tracking
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input: need at least {needed} bytes, got {actual}")]
    MalformedInput { needed: usize, actual: usize },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid proximity UUID: {0}")]
    InvalidUuid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Task error: {0}")]
    Task(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new malformed input error
    pub fn malformed(needed: usize, actual: usize) -> Self {
        Error::MalformedInput { needed, actual }
    }

    /// Creates a new invalid payload error
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Error::InvalidPayload(msg.into())
    }

    /// Creates a new invalid UUID error
    pub fn invalid_uuid(msg: impl Into<String>) -> Self {
        Error::InvalidUuid(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new channel closed error
    pub fn channel_closed(msg: impl Into<String>) -> Self {
        Error::ChannelClosed(msg.into())
    }

    /// Creates a new task error
    pub fn task(msg: impl Into<String>) -> Self {
        Error::Task(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test error");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_malformed_message() {
        let err = Error::malformed(15, 3);
        assert!(matches!(err, Error::MalformedInput { needed: 15, actual: 3 }));
        assert_eq!(err.to_string(), "Malformed input: need at least 15 bytes, got 3");
    }
}
