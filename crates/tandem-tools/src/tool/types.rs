//! Tool input/output types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ToolError, ToolResult};
use crate::process::ProcessId;

/// Input to a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    /// The call ID.
    pub call_id: Uuid,

    /// Arguments from the tool call.
    pub arguments: Value,
}

impl ToolInput {
    /// Wraps arguments with a fresh call ID.
    pub fn new(arguments: Value) -> Self {
        Self {
            call_id: Uuid::now_v7(),
            arguments,
        }
    }

    /// Deserializes the arguments into the tool's input struct.
    pub fn parse<T: DeserializeOwned>(&self) -> ToolResult<T> {
        if !self.arguments.is_object() {
            return Err(ToolError::invalid_input("arguments must be a JSON object"));
        }

        Ok(serde_json::from_value(self.arguments.clone())?)
    }
}

/// Output of a tool execution, rendered by the agent host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Message shown to the user.
    pub text: String,

    /// Structured payload.
    #[serde(default)]
    pub data: Value,

    /// Background processes started by the call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessId>,
}

impl ToolOutput {
    /// Creates an output with a message and payload.
    pub fn new(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            data,
            processes: Vec::new(),
        }
    }

    /// Attaches a background process.
    #[must_use]
    pub fn with_process(mut self, id: ProcessId) -> Self {
        self.processes.push(id);
        self
    }
}
