//! The `call-vapi` tool.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::VapiClient;
use crate::error::{ToolError, ToolResult};
use crate::process::{ProcessManager, ProcessResult};
use crate::tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};

/// Tool id.
pub const CALL_VAPI: &str = "call-vapi";

/// Arguments of the `call-vapi` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallVapiInput {
    /// Number to call.
    pub phone_number: String,
}

/// Starts a phone call in the background and returns immediately.
#[derive(Debug, Clone)]
pub struct CallVapiTool {
    client: VapiClient,
    processes: ProcessManager,
}

impl CallVapiTool {
    /// Creates the tool.
    pub fn new(client: VapiClient, processes: ProcessManager) -> Self {
        Self { client, processes }
    }

    /// Definition advertised to the agent host.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            CALL_VAPI,
            "Call Vapi",
            "Initiate a phone call to a specified number given by the user. The call will be \
             handled by Vapi and will be completed automatically.",
            json!({
                "type": "object",
                "properties": {
                    "phoneNumber": {
                        "type": "string",
                        "description": "The phone number to call"
                    }
                },
                "required": ["phoneNumber"]
            }),
        )
    }

    /// Adds the tool to `registry`.
    pub fn register(self, registry: &mut ToolRegistry) {
        registry.register_fn(Self::definition(), move |input| {
            let tool = self.clone();
            async move { tool.call(input).await }
        });
    }

    /// Runs the tool.
    pub async fn call(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let CallVapiInput { phone_number } = input.parse()?;
        if phone_number.trim().is_empty() {
            return Err(ToolError::invalid_input("phoneNumber must not be empty"));
        }

        let client = self.client.clone();
        let description = format!("Calling {phone_number}");
        let handle = self
            .processes
            .spawn("Phone Call", description, move |_| async move {
                match client.create_call(&phone_number).await {
                    Ok(call) => Ok(ProcessResult::new(
                        "Call completed successfully",
                        json!({
                            "result": format!("Call initiated successfully. Call ID: {}", call.id),
                            "callId": call.id,
                            "status": call.status,
                        }),
                    )),
                    Err(error) => Err(format!("Failed to initiate call: {error}")),
                }
            })
            .await;

        let id = handle.id();
        Ok(
            ToolOutput::new("Phone call initiated", json!({ "processId": id }))
                .with_process(id),
        )
    }
}
