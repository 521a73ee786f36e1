//! Tool error types.

use thiserror::Error;

/// Result type for tool execution.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised while running a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool arguments did not match its input schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No tool is registered under the requested id.
    #[error("tool '{0}' not found")]
    NotFound(String),

    /// The tool is missing required configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The collaborator behind the tool failed.
    #[error("{message}")]
    Upstream {
        /// Message shown to the agent.
        message: String,
        /// Underlying failure.
        #[source]
        source: Option<tandem_core::Error>,
    },
}

impl ToolError {
    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an upstream error carrying its cause.
    pub fn upstream(message: impl Into<String>, source: impl Into<tandem_core::Error>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
