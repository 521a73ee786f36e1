//! Embedding provider trait and the service wrapper around it.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use tandem_core::{Result, ServiceHealth};

use crate::TRACING_TARGET;
use crate::embeddings::Embeddings;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Embeds `text`, returning one vector per chunk the model produced.
    async fn embed(&self, text: &str) -> Result<Embeddings>;

    /// Performs a health check on the provider.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Embedding service with observability.
///
/// Wraps any [`EmbeddingProvider`] and logs every call with its latency.
#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
}

impl fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl EmbeddingService {
    /// Creates a new embedding service from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: EmbeddingProvider + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Embeds `text`.
    pub async fn embed(&self, text: &str) -> Result<Embeddings> {
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET,
            provider = self.provider_name(),
            text_len = text.len(),
            "Processing embedding request"
        );

        let result = self.provider.embed(text).await;
        let elapsed = Timestamp::now().duration_since(started_at);

        match &result {
            Ok(embeddings) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    count = embeddings.len(),
                    dimensions = embeddings.dimensions(),
                    elapsed_ms = elapsed.as_millis(),
                    "Embedding generation successful"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Embedding generation failed"
                );
            }
        }

        result
    }

    /// Performs a health check on the provider.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.provider.health_check().await
    }
}
