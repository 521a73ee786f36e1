//! Tool definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool exposed to the agent host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique, kebab-case identifier used for routing.
    id: String,

    /// Human-readable name.
    name: String,

    /// Description the agent uses to decide when to call the tool.
    description: String,

    /// JSON Schema of the tool input.
    input: Value,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            input,
        }
    }

    /// Returns the tool id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    pub fn input(&self) -> &Value {
        &self.input
    }
}
