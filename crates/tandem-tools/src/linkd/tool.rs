//! The `search-users` tool.

use serde_json::json;
use tandem_reqwest::ReqwestClient;

use super::LinkdConfig;
use super::types::{LinkdUser, SearchResponse, SearchUsersInput};
use crate::TRACING_TARGET;
use crate::error::{ToolError, ToolResult};
use crate::tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};

/// Tool id.
pub const SEARCH_USERS: &str = "search-users";

/// Result count used when the caller does not pass `limit`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

const SEARCH_FAILED: &str = "Failed to perform search. Please check your API key and try again.";

/// Searches Linkd for people matching a free-text description.
#[derive(Debug, Clone)]
pub struct SearchUsersTool {
    http: ReqwestClient,
    config: LinkdConfig,
}

impl SearchUsersTool {
    /// Creates the tool.
    pub fn new(config: LinkdConfig, http: ReqwestClient) -> Self {
        Self { http, config }
    }

    /// Definition advertised to the agent host.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            SEARCH_USERS,
            "Search Users",
            "Search for users based on query and optional school filter. Provide a detailed \
             description of who we are looking for; returns a list of matching users. Invoke \
             this tool after the phone call with the assistant has ended.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Detailed search query"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of results to return",
                        "default": DEFAULT_SEARCH_LIMIT
                    },
                    "school": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of schools to filter by"
                    }
                },
                "required": ["query"]
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
        let input: SearchUsersInput = input.parse()?;
        if input.query.trim().is_empty() {
            return Err(ToolError::invalid_input("query must not be empty"));
        }

        let users = self.search(&input).await?;
        let text = format!(
            "Found {} users matching the query \"{}\"",
            users.len(),
            input.query
        );

        Ok(ToolOutput::new(text, json!({ "users": users })))
    }

    /// Calls the search endpoint and reshapes the results.
    pub async fn search(&self, input: &SearchUsersInput) -> ToolResult<Vec<LinkdUser>> {
        if self.config.api_key.trim().is_empty() {
            return Err(ToolError::Upstream {
                message: SEARCH_FAILED.to_owned(),
                source: Some(
                    tandem_core::Error::configuration().with_message("Linkd API key is not set"),
                ),
            });
        }

        let limit = input.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let mut query = vec![("query", input.query.clone())];
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }
        for school in input.school.iter().flatten() {
            query.push(("school", school.clone()));
        }

        let request = self
            .http
            .get(self.config.search_url())
            .bearer_auth(&self.config.api_key)
            .query(&query);

        let response: SearchResponse = self.http.send_json(request).await.map_err(|error| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                "Linkd search failed"
            );
            ToolError::upstream(SEARCH_FAILED, error)
        })?;

        Ok(response.results.into_iter().map(LinkdUser::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use tandem_reqwest::ReqwestConfig;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn tool(server: &MockServer, api_key: &str) -> anyhow::Result<SearchUsersTool> {
        let config = LinkdConfig::new(api_key).with_api_url(format!("{}/api", server.uri()));
        Ok(SearchUsersTool::new(
            config,
            ReqwestClient::new(ReqwestConfig::default())?,
        ))
    }

    #[tokio::test]
    async fn shapes_search_results() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search/users"))
            .and(query_param("query", "rust engineers"))
            .and(query_param("limit", "10"))
            .and(query_param("school", "MIT"))
            .and(header("authorization", "Bearer linkd-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "profile": {
                        "id": "u-1",
                        "name": "Grace Hopper",
                        "location": "Arlington",
                        "headline": "Compilers",
                        "description": null,
                        "title": "Rear Admiral",
                        "profile_picture_url": "https://example.com/grace.jpg",
                        "linkedin_url": "https://linkedin.com/in/grace"
                    },
                    "experience": [],
                    "education": [{ "school": "Yale" }]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = tool(&server, "linkd-key")?
            .call(ToolInput::new(json!({
                "query": "rust engineers",
                "school": ["MIT"]
            })))
            .await?;

        assert_eq!(
            output.text,
            "Found 1 users matching the query \"rust engineers\""
        );
        let user = &output.data["users"][0];
        assert_eq!(user["id"], "u-1");
        assert_eq!(user["description"], "");
        assert_eq!(user["linkedinProfile"], "https://linkedin.com/in/grace");
        assert_eq!(user["education"][0]["school"], "Yale");
        Ok(())
    }

    #[tokio::test]
    async fn upstream_failure_uses_fixed_message() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = tool(&server, "wrong")?
            .call(ToolInput::new(json!({ "query": "anyone" })))
            .await
            .unwrap_err();

        assert!(matches!(error, ToolError::Upstream { .. }));
        assert_eq!(error.to_string(), SEARCH_FAILED);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_skips_request() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = tool(&server, "linkd-key")?;
        for arguments in [json!({}), json!({ "query": 7 }), json!({ "query": "  " })] {
            let error = tool.call(ToolInput::new(arguments)).await.unwrap_err();
            assert!(matches!(error, ToolError::InvalidInput(_)));
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_request() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let error = tool(&server, "")?
            .call(ToolInput::new(json!({ "query": "anyone" })))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), SEARCH_FAILED);
        Ok(())
    }
}
