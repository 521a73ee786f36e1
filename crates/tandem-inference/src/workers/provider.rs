//! Workers AI embedding provider.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tandem_core::{Error, Result, ServiceHealth};
use tandem_reqwest::ReqwestClient;
use tandem_reqwest::cloudflare::{CloudflareConfig, Envelope};

use super::WorkersAiConfig;
use crate::TRACING_TARGET;
use crate::embeddings::Embeddings;
use crate::service::EmbeddingProvider;

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunResult {
    #[serde(default)]
    shape: Vec<usize>,
    #[serde(default)]
    data: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

/// Embeds text with a Workers AI model over the REST API.
#[derive(Clone)]
pub struct WorkersAiProvider {
    http: ReqwestClient,
    cloudflare: CloudflareConfig,
    config: WorkersAiConfig,
}

impl WorkersAiProvider {
    /// Creates a new provider.
    pub fn new(
        cloudflare: CloudflareConfig,
        config: WorkersAiConfig,
        http: ReqwestClient,
    ) -> Result<Self> {
        if !cloudflare.is_configured() {
            return Err(Error::configuration()
                .with_message("Cloudflare account id and API token are required for Workers AI"));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            model = %config.model,
            "Workers AI provider initialized"
        );

        Ok(Self {
            http,
            cloudflare,
            config,
        })
    }

    fn run_url(&self) -> String {
        self.cloudflare.account_url(&format!("ai/run/{}", self.config.model))
    }

    /// Looks the model up in the account's model catalog.
    ///
    /// Checks the credentials and the model name without running (and
    /// paying for) an inference.
    async fn model_listed(&self) -> Result<bool> {
        let request = self
            .http
            .get(self.cloudflare.account_url("ai/models/search"))
            .bearer_auth(&self.cloudflare.api_token)
            .query(&[("search", self.config.model.as_str())]);

        let envelope: Envelope<Vec<ModelEntry>> = self.http.send_json(request).await?;
        let models = envelope.into_result()?;
        Ok(models.iter().any(|model| model.name == self.config.model))
    }
}

impl std::fmt::Debug for WorkersAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkersAiProvider")
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for WorkersAiProvider {
    fn provider_name(&self) -> &'static str {
        "workers-ai"
    }

    async fn embed(&self, text: &str) -> Result<Embeddings> {
        let request = self
            .http
            .post(self.run_url())
            .bearer_auth(&self.cloudflare.api_token)
            .json(&RunRequest { text });

        let envelope: Envelope<RunResult> = self.http.send_json(request).await?;
        let result = envelope.into_result()?;

        let Some(data) = result.data else {
            return Err(
                Error::external_error().with_message("embedding response is missing data")
            );
        };

        if let Some(&rows) = result.shape.first()
            && rows != data.len()
        {
            tracing::warn!(
                target: TRACING_TARGET,
                shape = ?result.shape,
                rows = data.len(),
                "Embedding shape disagrees with data"
            );
        }

        Embeddings::new(data)
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let started_at = Instant::now();

        let health = match self.model_listed().await {
            Ok(true) => ServiceHealth::healthy(),
            Ok(false) => ServiceHealth::unhealthy(format!(
                "model '{}' is not available to this account",
                self.config.model
            )),
            Err(error) if error.is_retryable() => ServiceHealth::degraded(error.to_string()),
            Err(error) => ServiceHealth::unhealthy(error.to_string()),
        };

        Ok(health.with_response_time(started_at.elapsed()))
    }
}
