//! Tool host routes: tool definitions, tool calls and process status.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tandem_tools::{
    ProcessId, ProcessManager, ProcessSnapshot, ToolDefinition, ToolInput, ToolOutput,
    ToolRegistry,
};

use crate::handler::response::HealthResponse;
use crate::handler::{ErrorKind, Result};
use crate::service::ToolHostState;

/// Tracing target for tool host requests.
const TRACING_TARGET: &str = "tandem_server::handler::tools";

async fn list_tools(State(registry): State<ToolRegistry>) -> Json<Vec<ToolDefinition>> {
    Json(registry.definitions().cloned().collect())
}

#[tracing::instrument(skip_all, fields(tool = %id))]
async fn run_tool(
    State(registry): State<ToolRegistry>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ToolOutput>> {
    if !registry.has_tool(&id) {
        return Err(ErrorKind::NotFound.with_message(format!("tool '{id}' not found")));
    }

    let arguments: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(|error| {
            ErrorKind::BadRequest
                .with_message("Request body must be valid JSON")
                .with_context(error.to_string())
        })?
    };

    let output = registry.execute(&id, ToolInput::new(arguments)).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        processes = output.processes.len(),
        "Tool call answered"
    );

    Ok(Json(output))
}

async fn get_process(
    State(processes): State<ProcessManager>,
    Path(id): Path<ProcessId>,
) -> Result<Json<ProcessSnapshot>> {
    match processes.get(id).await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(ErrorKind::NotFound.with_message(format!("process '{id}' not found"))),
    }
}

async fn health(
    State(registry): State<ToolRegistry>,
    State(processes): State<ProcessManager>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        tools: registry.len(),
        processes: processes.len().await,
    })
}

async fn not_found() -> ErrorKind {
    ErrorKind::NotFound
}

/// Returns the tool host [`Router`].
pub fn routes(state: ToolHostState) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{id}", post(run_tool))
        .route("/processes/{id}", get(get_process))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use tandem_tools::process::ProcessResult;
    use tandem_tools::{ProcessState, ToolError};

    use super::*;

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new(
            "echo",
            "Echo",
            "Returns its input",
            json!({ "type": "object", "properties": { "message": { "type": "string" } } }),
        )
    }

    fn registry(processes: &ProcessManager) -> ToolRegistry {
        let mut registry = ToolRegistry::default();

        registry.register_fn(echo_definition(), |input: ToolInput| async move {
            let message = input
                .arguments
                .get("message")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::invalid_input("message is required"))?
                .to_owned();
            Ok(ToolOutput::new(message, json!({})))
        });

        registry.register_fn(
            ToolDefinition::new("broken", "Broken", "Always fails", json!({})),
            |_| async {
                Err(ToolError::upstream(
                    "Failed to perform search.",
                    tandem_core::Error::timeout(),
                ))
            },
        );

        let manager = processes.clone();
        registry.register_fn(
            ToolDefinition::new("slow", "Slow", "Starts a failing process", json!({})),
            move |_| {
                let manager = manager.clone();
                async move {
                    let handle = manager
                        .spawn("Slow", "Gives up", |_| async {
                            Err::<ProcessResult, _>("gave up")
                        })
                        .await;
                    Ok(ToolOutput::new("started", json!({})).with_process(handle.id()))
                }
            },
        );

        registry
    }

    async fn server() -> anyhow::Result<(TestServer, ProcessManager)> {
        let processes = ProcessManager::new();
        let state = ToolHostState::new(registry(&processes), processes.clone());
        Ok((TestServer::new(routes(state))?, processes))
    }

    #[tokio::test]
    async fn lists_tool_definitions() -> anyhow::Result<()> {
        let (server, _) = server().await?;

        let response = server.get("/tools").await;
        response.assert_status_ok();

        let definitions = response.json::<Vec<ToolDefinition>>();
        let ids: Vec<_> = definitions.iter().map(ToolDefinition::id).collect();
        assert_eq!(ids, ["broken", "echo", "slow"]);
        Ok(())
    }

    #[tokio::test]
    async fn runs_a_tool() -> anyhow::Result<()> {
        let (server, _) = server().await?;

        let response = server
            .post("/tools/echo")
            .json(&json!({ "message": "hi" }))
            .await;
        response.assert_status_ok();

        let output = response.json::<ToolOutput>();
        assert_eq!(output.text, "hi");
        assert!(output.processes.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn tool_errors_map_to_status_codes() -> anyhow::Result<()> {
        let (server, _) = server().await?;

        server
            .post("/tools/echo")
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/tools/echo")
            .text("{not json")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server.post("/tools/missing").json(&json!({})).await;
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_text("tool 'missing' not found");

        let response = server.post("/tools/broken").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        response.assert_text("Failed to perform search.");
        Ok(())
    }

    #[tokio::test]
    async fn reports_process_status() -> anyhow::Result<()> {
        let (server, processes) = server().await?;

        let output = server.post("/tools/slow").await.json::<ToolOutput>();
        let id = output.processes[0];

        let mut handle = processes.subscribe(id).await.unwrap();
        handle.wait().await;

        let response = server.get(&format!("/processes/{id}")).await;
        response.assert_status_ok();
        let snapshot = response.json::<ProcessSnapshot>();
        assert_eq!(snapshot.id, id);
        assert_eq!(snapshot.name, "Slow");
        assert_eq!(snapshot.state, ProcessState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("gave up"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_process_is_not_found() -> anyhow::Result<()> {
        let (server, _) = server().await?;

        let response = server.get(&format!("/processes/{}", ProcessId::new())).await;
        response.assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_counts() -> anyhow::Result<()> {
        let (server, _) = server().await?;

        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<HealthResponse>(),
            HealthResponse {
                status: "ok".to_owned(),
                tools: 3,
                processes: 0,
            }
        );
        Ok(())
    }
}
