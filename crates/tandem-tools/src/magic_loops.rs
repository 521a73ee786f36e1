//! The `find-email` tool, backed by a Magic Loops loop.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tandem_reqwest::ReqwestClient;

use crate::TRACING_TARGET;
use crate::error::{ToolError, ToolResult};
use crate::tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};

/// Tool id.
pub const FIND_EMAIL: &str = "find-email";

/// Default loop resolving LinkedIn usernames to e-mail addresses.
pub const DEFAULT_MAGIC_LOOPS_URL: &str =
    "https://magicloops.dev/api/loop/a436e267-305e-4cd6-8594-85406f8fe090/run";

const LOOKUP_FAILED: &str = "Error occurred while calling Magic Loops API";

/// Magic Loops configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MagicLoopsConfig {
    /// Magic Loops run URL used for e-mail lookup
    #[cfg_attr(
        feature = "config",
        arg(
            id = "magic-loops-url",
            long = "magic-loops-url",
            env = "MAGIC_LOOPS_URL",
            default_value = DEFAULT_MAGIC_LOOPS_URL
        )
    )]
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    DEFAULT_MAGIC_LOOPS_URL.to_owned()
}

impl Default for MagicLoopsConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl MagicLoopsConfig {
    /// Creates a configuration for the given loop URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Arguments of the `find-email` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindEmailInput {
    /// LinkedIn username to look up.
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    email: Option<String>,
}

/// Looks up an e-mail address from a LinkedIn username.
///
/// Lookup failures are reported in the output rather than as errors, so
/// the agent can carry on without the address.
#[derive(Debug, Clone)]
pub struct FindEmailTool {
    http: ReqwestClient,
    config: MagicLoopsConfig,
}

impl FindEmailTool {
    /// Creates the tool.
    pub fn new(config: MagicLoopsConfig, http: ReqwestClient) -> Self {
        Self { http, config }
    }

    /// Definition advertised to the agent host.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            FIND_EMAIL,
            "Find Email",
            "Finds the email address of a user from their linkedin username",
            json!({
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "Username to search for"
                    }
                },
                "required": ["username"]
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
        let input: FindEmailInput = input.parse()?;
        if input.username.trim().is_empty() {
            return Err(ToolError::invalid_input("username must not be empty"));
        }

        let request = self
            .http
            .post(&self.config.url)
            .json(&json!({ "username": input.username }));

        match self.http.send_json::<LookupResponse>(request).await {
            Ok(response) => Ok(ToolOutput::new(
                "Successfully called Magic Loops API",
                json!({ "email": response.email }),
            )),
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    username = %input.username,
                    "Magic Loops lookup failed"
                );
                Ok(ToolOutput::new(LOOKUP_FAILED, json!({ "response": null })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tandem_reqwest::ReqwestConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn tool(server: &MockServer) -> anyhow::Result<FindEmailTool> {
        let config = MagicLoopsConfig::new(format!("{}/loop/run", server.uri()));
        Ok(FindEmailTool::new(
            config,
            ReqwestClient::new(ReqwestConfig::default())?,
        ))
    }

    #[tokio::test]
    async fn returns_found_email() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loop/run"))
            .and(body_json(json!({ "username": "ada" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "email": "ada@example.com" })),
            )
            .mount(&server)
            .await;

        let output = tool(&server)?
            .call(ToolInput::new(json!({ "username": "ada" })))
            .await?;

        assert_eq!(output.text, "Successfully called Magic Loops API");
        assert_eq!(output.data, json!({ "email": "ada@example.com" }));
        Ok(())
    }

    #[tokio::test]
    async fn failure_is_reported_in_output() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let output = tool(&server)?
            .call(ToolInput::new(json!({ "username": "ada" })))
            .await?;

        assert_eq!(output.text, LOOKUP_FAILED);
        assert_eq!(output.data, json!({ "response": null }));
        Ok(())
    }

    #[tokio::test]
    async fn username_is_required() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let error = tool(&server)?
            .call(ToolInput::new(json!({ "user": "ada" })))
            .await
            .unwrap_err();

        assert!(matches!(error, ToolError::InvalidInput(_)));
        Ok(())
    }
}
