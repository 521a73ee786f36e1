//! Reqwest-based HTTP client shared by collaborator integrations.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, IntoUrl, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::ReqwestConfig;
use crate::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "tandem_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Cheaply cloneable HTTP client.
///
/// Every collaborator integration builds its requests through this client so
/// that timeouts, the user agent and status handling stay consistent.
///
/// # Examples
///
/// ```rust,ignore
/// use tandem_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let request = client.get("https://search.linkd.inc/api/search/users").bearer_auth(key);
/// let body: serde_json::Value = client.send_json(request).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            user_agent = %user_agent,
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        let inner = ReqwestClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Starts a GET request.
    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        self.inner.http.get(url)
    }

    /// Starts a POST request.
    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        self.inner.http.post(url)
    }

    /// Sends the request and fails on any non-success status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let started_at = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(
            target: TRACING_TARGET,
            url = %response.url(),
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Collaborator responded"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            "Collaborator returned an error status"
        );

        Err(Error::status(status, body))
    }

    /// Sends the request and decodes a JSON response body.
    pub async fn send_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
