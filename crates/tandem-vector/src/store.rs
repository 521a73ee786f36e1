//! Vector store trait and the logging wrapper around it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tandem_core::{Metadata, ServiceHealth};
use tandem_reqwest::ReqwestClient;
use tandem_reqwest::cloudflare::CloudflareConfig;

use crate::TRACING_TARGET;
use crate::config::{VectorBackendKind, VectorStoreConfig};
use crate::error::{VectorError, VectorResult};
use crate::ids::{IdStrategy, sequential_ids, uuid_ids};
use crate::memory::MemoryBackend;
use crate::vectorize::VectorizeBackend;

/// Number of matches returned when the caller does not ask for a specific amount.
pub const DEFAULT_TOP_K: usize = 10;

/// A vector persisted in the index.
///
/// IDs are assigned by the indexing workflow, never by the caller, and the
/// entry is immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    /// Unique identifier within the index.
    pub id: String,
    /// The embedding.
    pub values: Vec<f32>,
    /// Caller supplied metadata.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Optional namespace (partition) within the index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl IndexedVector {
    /// Creates a vector without metadata.
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: Metadata::new(),
            namespace: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Places the vector in a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }
}

/// A nearest-neighbour match. Higher scores are closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// ID of the matched vector.
    pub id: String,
    /// Similarity score; range and ordering are defined by the store.
    pub score: f32,
    /// Metadata of the matched vector; empty when not requested.
    #[serde(default)]
    pub metadata: Metadata,
    /// The matched vector, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    /// Namespace of the matched vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Index statistics reported by `describe`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescription {
    /// Number of vectors currently stored.
    pub vector_count: u64,
    /// Dimensionality of the index, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

/// Acknowledgement of an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReceipt {
    /// Backend mutation identifier, if the backend issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_id: Option<String>,
    /// Number of vectors submitted.
    pub count: usize,
}

/// Query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of matches.
    pub top_k: usize,
    /// Include metadata in matches.
    pub return_metadata: bool,
    /// Include vector values in matches.
    pub return_values: bool,
    /// Restrict the query to a namespace.
    pub namespace: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            return_metadata: false,
            return_values: false,
            namespace: None,
        }
    }
}

impl QueryOptions {
    /// Creates options returning `top_k` matches.
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    /// Include metadata in results.
    #[must_use]
    pub fn with_metadata(mut self) -> Self {
        self.return_metadata = true;
        self
    }

    /// Include vectors in results.
    #[must_use]
    pub fn with_values(mut self) -> Self {
        self.return_values = true;
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }
}

/// Trait for vector store backends.
#[async_trait]
pub trait VectorStoreBackend: Send + Sync {
    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Reports index statistics.
    async fn describe(&self) -> VectorResult<IndexDescription>;

    /// Inserts or replaces vectors keyed by ID, as one batch.
    async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt>;

    /// Returns the nearest neighbours of `vector`, best first.
    async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> VectorResult<Vec<MatchResult>>;

    /// Atomically reserves `count` sequential numeric IDs and returns the first.
    async fn reserve_ids(&self, count: usize) -> VectorResult<u64> {
        let _ = count;
        Err(VectorError::unsupported(format!(
            "{} cannot reserve IDs atomically",
            self.backend_name()
        )))
    }

    /// Whether [`reserve_ids`](Self::reserve_ids) is implemented.
    fn supports_reservation(&self) -> bool {
        false
    }
}

/// Cloneable vector store handle that logs every operation.
#[derive(Clone)]
pub struct VectorStore {
    backend: Arc<dyn VectorStoreBackend>,
}

impl VectorStore {
    /// Wraps a backend.
    pub fn new<B>(backend: B) -> Self
    where
        B: VectorStoreBackend + 'static,
    {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Builds the configured backend.
    pub fn from_config(
        config: &VectorStoreConfig,
        cloudflare: &CloudflareConfig,
        http: &ReqwestClient,
    ) -> VectorResult<Self> {
        let store = match config.backend {
            VectorBackendKind::Vectorize => Self::new(VectorizeBackend::new(
                cloudflare.clone(),
                config.vectorize.clone(),
                http.clone(),
            )?),
            VectorBackendKind::Memory => Self::new(MemoryBackend::new(&config.memory)),
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = store.backend_name(),
            "Vector store initialized"
        );

        Ok(store)
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Reports index statistics.
    pub async fn describe(&self) -> VectorResult<IndexDescription> {
        let description = self.backend.describe().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend_name(),
            vector_count = description.vector_count,
            "Described index"
        );

        Ok(description)
    }

    /// Upserts vectors as one batch.
    pub async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt> {
        let started_at = Instant::now();
        let count = vectors.len();

        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend_name(),
            count,
            "Upserting vectors"
        );

        let result = self.backend.upsert(vectors).await;
        match &result {
            Ok(receipt) => tracing::debug!(
                target: TRACING_TARGET,
                mutation_id = receipt.mutation_id.as_deref().unwrap_or("-"),
                count = receipt.count,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Upsert accepted"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                count,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Upsert failed"
            ),
        }

        result
    }

    /// Searches for the nearest neighbours of `vector`.
    pub async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> VectorResult<Vec<MatchResult>> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend_name(),
            top_k = options.top_k,
            dimensions = vector.len(),
            "Querying vectors"
        );

        let result = self.backend.query(vector, options).await;
        match &result {
            Ok(matches) => tracing::debug!(
                target: TRACING_TARGET,
                matches = matches.len(),
                elapsed_ms = started_at.elapsed().as_millis(),
                "Query completed"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Query failed"
            ),
        }

        result
    }

    /// Produces `count` IDs for a new batch according to `strategy`.
    ///
    /// With [`IdStrategy::VectorCount`] the count is read and then written
    /// without any lock, so concurrent callers can receive the same IDs.
    pub async fn assign_ids(
        &self,
        strategy: IdStrategy,
        count: usize,
    ) -> VectorResult<Vec<String>> {
        let ids = match strategy {
            IdStrategy::VectorCount => {
                let description = self.describe().await?;
                sequential_ids(description.vector_count, count)
            }
            IdStrategy::Reserved => {
                let start = self.backend.reserve_ids(count).await?;
                sequential_ids(start, count)
            }
            IdStrategy::Uuid => uuid_ids(count),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            strategy = %strategy,
            first = ids.first().map(String::as_str).unwrap_or("-"),
            count,
            "Assigned vector IDs"
        );

        Ok(ids)
    }

    /// Checks that `strategy` can be used with this backend.
    pub fn check_strategy(&self, strategy: IdStrategy) -> VectorResult<()> {
        if strategy == IdStrategy::Reserved && !self.backend.supports_reservation() {
            return Err(VectorError::invalid_config(format!(
                "the {} backend does not support reserved IDs",
                self.backend_name()
            )));
        }

        Ok(())
    }

    /// Reports whether the index answers `describe`.
    pub async fn health_check(&self) -> ServiceHealth {
        let started_at = Instant::now();

        match self.backend.describe().await {
            Ok(_) => ServiceHealth::healthy().with_response_time(started_at.elapsed()),
            Err(error) => ServiceHealth::unhealthy(error.to_string())
                .with_response_time(started_at.elapsed()),
        }
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("backend", &self.backend_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;

    fn memory_store() -> VectorStore {
        VectorStore::new(MemoryBackend::new(&MemoryConfig::default()))
    }

    #[tokio::test]
    async fn vector_count_ids_start_at_current_count() -> anyhow::Result<()> {
        let store = memory_store();
        store
            .upsert(vec![
                IndexedVector::new("0", vec![1.0, 0.0]),
                IndexedVector::new("1", vec![0.0, 1.0]),
            ])
            .await?;

        let ids = store.assign_ids(IdStrategy::VectorCount, 3).await?;
        assert_eq!(ids, ["2", "3", "4"]);
        Ok(())
    }

    #[tokio::test]
    async fn vector_count_ids_collide_without_interleaved_write() -> anyhow::Result<()> {
        let store = memory_store();

        let first = store.assign_ids(IdStrategy::VectorCount, 1).await?;
        let second = store.assign_ids(IdStrategy::VectorCount, 1).await?;

        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn reserved_ids_never_overlap() -> anyhow::Result<()> {
        let store = memory_store();

        let first = store.assign_ids(IdStrategy::Reserved, 2).await?;
        let second = store.assign_ids(IdStrategy::Reserved, 2).await?;

        assert_eq!(first, ["0", "1"]);
        assert_eq!(second, ["2", "3"]);
        Ok(())
    }

    #[tokio::test]
    async fn uuid_ids_are_unique() -> anyhow::Result<()> {
        let store = memory_store();
        let ids = store.assign_ids(IdStrategy::Uuid, 4).await?;

        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 4);
        Ok(())
    }

    #[test]
    fn match_result_defaults_to_empty_metadata() {
        let json = serde_json::json!({ "id": "7", "score": 0.9 });
        let result: MatchResult = serde_json::from_value(json).unwrap();

        assert!(result.metadata.is_empty());

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized["metadata"], serde_json::json!({}));
        assert!(serialized.get("values").is_none());
    }
}
