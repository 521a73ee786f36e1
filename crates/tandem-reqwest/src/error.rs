//! Error types for outbound HTTP calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for tandem-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for outbound HTTP calls.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The collaborator reported a failure inside a successful response.
    #[error("API error: {0}")]
    Api(String),
    /// The collaborator answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status returned by the collaborator.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },
}

impl Error {
    /// Maximum number of body bytes kept in a status error.
    pub const MAX_BODY_LEN: usize = 512;

    /// Creates a status error, truncating the body on a char boundary.
    pub fn status(status: StatusCode, mut body: String) -> Self {
        if body.len() > Self::MAX_BODY_LEN {
            let mut end = Self::MAX_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }

        Self::Status { status, body }
    }

    /// Returns the HTTP status, if the collaborator answered.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Reqwest(e) => e.status(),
            Self::Status { status, .. } => Some(*status),
            Self::Serde(_) | Self::Api(_) => None,
        }
    }
}

impl From<Error> for tandem_core::Error {
    fn from(err: Error) -> Self {
        use tandem_core::{Error as CoreError, ErrorKind};

        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    CoreError::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    CoreError::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    CoreError::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    CoreError::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => CoreError::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Api(reason) => CoreError::external_error()
                .with_message("Collaborator reported an error")
                .with_context(reason),
            Error::Status { status, body } => {
                let kind = match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
                    StatusCode::NOT_FOUND => ErrorKind::NotFound,
                    StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
                    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                        ErrorKind::InvalidInput
                    }
                    StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
                    StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                        ErrorKind::ServiceUnavailable
                    }
                    _ => ErrorKind::ExternalError,
                };

                CoreError::new(kind)
                    .with_message(format!("Collaborator responded with {status}"))
                    .with_context(body)
            }
        }
    }
}
