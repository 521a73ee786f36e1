//! Tool registry for managing available tools.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{ToolDefinition, ToolInput, ToolOutput};
use crate::TRACING_TARGET;
use crate::error::{ToolError, ToolResult};

/// Handler function for tool execution.
pub type ToolHandler =
    Arc<dyn Fn(ToolInput) -> BoxFuture<'static, ToolResult<ToolOutput>> + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

/// Registry of available tools, keyed and listed by id.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<RegisteredTool>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same id.
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        let id = definition.id().to_owned();
        self.tools
            .insert(id, Arc::new(RegisteredTool { definition, handler }));
    }

    /// Registers a tool backed by an async function.
    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, f: F)
    where
        F: Fn(ToolInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<ToolOutput>> + Send + 'static,
    {
        self.register(definition, Arc::new(move |input| f(input).boxed()));
    }

    /// Returns a tool definition by id.
    pub fn get_definition(&self, id: &str) -> Option<&ToolDefinition> {
        self.tools.get(id).map(|tool| &tool.definition)
    }

    /// Returns all tool definitions ordered by id.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|tool| &tool.definition)
    }

    /// Returns whether a tool exists.
    pub fn has_tool(&self, id: &str) -> bool {
        self.tools.contains_key(id)
    }

    /// Runs the tool registered under `id`.
    pub async fn execute(&self, id: &str, input: ToolInput) -> ToolResult<ToolOutput> {
        let Some(tool) = self.tools.get(id).cloned() else {
            return Err(ToolError::NotFound(id.to_owned()));
        };

        let started_at = Instant::now();
        let call_id = input.call_id;

        tracing::debug!(
            target: TRACING_TARGET,
            tool = id,
            call_id = %call_id,
            "Executing tool"
        );

        let result = (tool.handler)(input).await;
        match &result {
            Ok(output) => tracing::info!(
                target: TRACING_TARGET,
                tool = id,
                call_id = %call_id,
                processes = output.processes.len(),
                elapsed_ms = started_at.elapsed().as_millis(),
                "Tool completed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                tool = id,
                call_id = %call_id,
                error = %error,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Tool failed"
            ),
        }

        result
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn echo_definition(id: &str) -> ToolDefinition {
        ToolDefinition::new(id, "Echo", "Echoes its input", json!({ "type": "object" }))
    }

    #[tokio::test]
    async fn executes_registered_tool() -> anyhow::Result<()> {
        let mut registry = ToolRegistry::new();
        registry.register_fn(echo_definition("echo"), |input: ToolInput| async move {
            Ok(ToolOutput::new("echoed", input.arguments))
        });

        let output = registry
            .execute("echo", ToolInput::new(json!({ "a": 1 })))
            .await?;

        assert_eq!(output.text, "echoed");
        assert_eq!(output.data, json!({ "a": 1 }));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let result = registry.execute("missing", ToolInput::new(json!({}))).await;

        assert!(matches!(result, Err(ToolError::NotFound(id)) if id == "missing"));
    }

    #[test]
    fn definitions_are_sorted_by_id() {
        let mut registry = ToolRegistry::new();
        for id in ["search-users", "call-vapi", "find-email"] {
            registry.register_fn(echo_definition(id), |_| async {
                Ok(ToolOutput::new("", json!(null)))
            });
        }

        let ids: Vec<_> = registry.definitions().map(ToolDefinition::id).collect();
        assert_eq!(ids, ["call-vapi", "find-email", "search-users"]);
        assert!(registry.has_tool("find-email"));
        assert_eq!(registry.len(), 3);
    }
}
