//! The `generate-embeddings` tool, a client of the tandem indexer.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tandem_reqwest::ReqwestClient;
use tandem_vector::MatchResult;

use crate::TRACING_TARGET;
use crate::error::{ToolError, ToolResult};
use crate::tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};

/// Tool id.
pub const GENERATE_EMBEDDINGS: &str = "generate-embeddings";

/// Default indexer endpoint.
pub const DEFAULT_INDEXER_URL: &str = "http://127.0.0.1:3000/";

const GENERATE_FAILED: &str = "Failed to generate embeddings";

/// Location of the embedding indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct IndexerClientConfig {
    /// URL of the embedding indexer
    #[cfg_attr(
        feature = "config",
        arg(
            id = "indexer-url",
            long = "indexer-url",
            env = "INDEXER_URL",
            default_value = DEFAULT_INDEXER_URL
        )
    )]
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    DEFAULT_INDEXER_URL.to_owned()
}

impl Default for IndexerClientConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl IndexerClientConfig {
    /// Creates a configuration for the given indexer URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Arguments of the `generate-embeddings` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateEmbeddingsInput {
    /// User profile details in markdown.
    pub text: String,
    /// The current user's e-mail address.
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerResponse {
    #[serde(default)]
    similar_items: Vec<MatchResult>,
}

/// Indexes a user profile and returns the most similar stored profiles.
#[derive(Debug, Clone)]
pub struct GenerateEmbeddingsTool {
    http: ReqwestClient,
    config: IndexerClientConfig,
}

impl GenerateEmbeddingsTool {
    /// Creates the tool.
    pub fn new(config: IndexerClientConfig, http: ReqwestClient) -> Self {
        Self { http, config }
    }

    /// Definition advertised to the agent host.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            GENERATE_EMBEDDINGS,
            "Generate Embeddings",
            "Generate embeddings from user profile details after generating the profile based \
             on the call. Invoke this tool after we have created the user's profile.",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "User profile details in markdown format"
                    },
                    "email": {
                        "type": "string",
                        "description": "The current user's email address"
                    }
                },
                "required": ["text", "email"]
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
        let input: GenerateEmbeddingsInput = input.parse()?;
        let matches = self.index(&input).await?;

        Ok(ToolOutput::new(
            "Successfully generated embeddings for the user profile",
            serde_json::to_value(matches)?,
        ))
    }

    /// Posts the profile to the indexer and returns its similar items.
    pub async fn index(&self, input: &GenerateEmbeddingsInput) -> ToolResult<Vec<MatchResult>> {
        let request = self.http.post(&self.config.url).json(input);

        let response: IndexerResponse = self.http.send_json(request).await.map_err(|error| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                "Indexer call failed"
            );
            ToolError::upstream(GENERATE_FAILED, error)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            matches = response.similar_items.len(),
            "Profile indexed"
        );

        Ok(response.similar_items)
    }
}

#[cfg(test)]
mod tests {
    use tandem_reqwest::ReqwestConfig;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn tool(server: &MockServer) -> anyhow::Result<GenerateEmbeddingsTool> {
        Ok(GenerateEmbeddingsTool::new(
            IndexerClientConfig::new(server.uri()),
            ReqwestClient::new(ReqwestConfig::default())?,
        ))
    }

    #[tokio::test]
    async fn returns_similar_items() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "text": "# Ada", "email": "ada@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "newEmbedding": [0.1, 0.2],
                "similarItems": [
                    { "id": "3", "score": 0.9, "metadata": { "email": "bob@example.com" } }
                ]
            })))
            .mount(&server)
            .await;

        let output = tool(&server)?
            .call(ToolInput::new(json!({ "text": "# Ada", "email": "ada@example.com" })))
            .await?;

        assert_eq!(
            output.text,
            "Successfully generated embeddings for the user profile"
        );
        assert_eq!(output.data[0]["id"], "3");
        assert_eq!(output.data[0]["metadata"]["email"], "bob@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn indexer_failure_is_upstream_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let error = tool(&server)?
            .call(ToolInput::new(json!({ "text": "# Ada", "email": "ada@example.com" })))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), GENERATE_FAILED);
        Ok(())
    }

    #[tokio::test]
    async fn email_is_required() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let error = tool(&server)?
            .call(ToolInput::new(json!({ "text": "# Ada" })))
            .await
            .unwrap_err();

        assert!(matches!(error, ToolError::InvalidInput(_)));
        Ok(())
    }
}
