//! Vector store error types.

use thiserror::Error;

/// Result type for vector store operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Vector store errors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected our credentials.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Operation timeout.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The backend cannot perform the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl VectorError {
    /// Creates a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<tandem_reqwest::Error> for VectorError {
    fn from(err: tandem_reqwest::Error) -> Self {
        use tandem_core::ErrorKind;

        let message = err.to_string();
        let core: tandem_core::Error = err.into();

        match core.kind() {
            ErrorKind::Authentication => Self::Authentication(message),
            ErrorKind::Timeout => Self::Timeout(message),
            ErrorKind::NetworkError | ErrorKind::ServiceUnavailable => Self::Connection(message),
            ErrorKind::Serialization => Self::Serialization(message),
            _ => Self::Backend(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use tandem_reqwest::{Error as HttpError, StatusCode};

    use super::*;

    #[test]
    fn http_errors_are_classified() {
        let unauthorized = HttpError::status(StatusCode::UNAUTHORIZED, "nope".into());
        assert!(matches!(
            VectorError::from(unauthorized),
            VectorError::Authentication(_)
        ));

        let unavailable = HttpError::status(StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert!(matches!(VectorError::from(unavailable), VectorError::Connection(_)));

        let api = HttpError::Api("index not found".into());
        assert!(matches!(VectorError::from(api), VectorError::Backend(_)));
    }
}
