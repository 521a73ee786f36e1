//! The embed, assign IDs, upsert, query workflow.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tandem_core::Metadata;
use tandem_inference::{EmbeddingService, Embeddings};
use tandem_vector::{IndexedVector, MatchResult, QueryOptions, VectorError, VectorStore};
use thiserror::Error;

use crate::service::{QueryMode, WorkflowConfig};

/// Tracing target for the indexing workflow.
pub const TRACING_TARGET: &str = "tandem_server::service::indexing";

/// Failure of one workflow step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The request or configuration is invalid; no collaborator was called.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The embedding provider failed or returned a malformed payload.
    #[error("embedding provider failed: {0}")]
    EmbeddingProvider(#[source] tandem_core::Error),

    /// The next IDs could not be determined.
    #[error("id assignment failed: {0}")]
    IdAssignment(#[source] VectorError),

    /// The upsert was rejected.
    #[error("vector upsert failed: {0}")]
    StoreWrite(#[source] VectorError),

    /// The similarity query failed. The upsert before it is not rolled back.
    #[error("vector query failed: {0}")]
    StoreQuery(#[source] VectorError),
}

impl WorkflowError {
    /// Name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validate",
            Self::EmbeddingProvider(_) => "embed",
            Self::IdAssignment(_) => "assign_ids",
            Self::StoreWrite(_) => "upsert",
            Self::StoreQuery(_) => "query",
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOutcome {
    /// First embedding of the input.
    pub new_embedding: Vec<f32>,
    /// IDs written by this run, in chunk order.
    pub inserted_ids: Vec<String>,
    /// Nearest neighbours, best first.
    pub similar_items: Vec<MatchResult>,
}

/// Indexes text and returns its nearest neighbours.
///
/// Steps run strictly in sequence and the run cannot be resumed. A failed
/// query leaves the upserted vectors in place.
#[derive(Clone)]
pub struct IndexingWorkflow {
    embeddings: EmbeddingService,
    store: VectorStore,
    config: WorkflowConfig,
}

impl IndexingWorkflow {
    /// Creates a workflow after checking the configuration against the store.
    pub fn new(
        embeddings: EmbeddingService,
        store: VectorStore,
        config: WorkflowConfig,
    ) -> Result<Self, WorkflowError> {
        config.validate()?;
        store
            .check_strategy(config.id_strategy)
            .map_err(WorkflowError::IdAssignment)?;

        tracing::info!(
            target: TRACING_TARGET,
            provider = embeddings.provider_name(),
            store = store.backend_name(),
            id_strategy = %config.id_strategy,
            query_mode = %config.query_mode,
            exclude_inserted = config.exclude_inserted,
            "Indexing workflow ready"
        );

        Ok(Self {
            embeddings,
            store,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Returns the vector store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Embeds `text`, stores the vectors with `metadata` and queries for
    /// the `top_k` most similar entries.
    pub async fn index_and_search(
        &self,
        text: &str,
        metadata: Metadata,
        top_k: usize,
    ) -> Result<IndexOutcome, WorkflowError> {
        let started_at = Instant::now();
        let result = self.run(text, metadata, top_k).await;

        match &result {
            Ok(outcome) => tracing::info!(
                target: TRACING_TARGET,
                inserted = outcome.inserted_ids.len(),
                matches = outcome.similar_items.len(),
                elapsed_ms = started_at.elapsed().as_millis(),
                "Indexed text"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET,
                step = error.step(),
                error = %error,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Indexing workflow failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        text: &str,
        metadata: Metadata,
        top_k: usize,
    ) -> Result<IndexOutcome, WorkflowError> {
        if top_k == 0 || top_k > self.config.max_top_k {
            return Err(WorkflowError::Validation(format!(
                "topK must be between 1 and {}",
                self.config.max_top_k
            )));
        }

        let embeddings = self
            .embeddings
            .embed(text)
            .await
            .map_err(WorkflowError::EmbeddingProvider)?;

        tracing::debug!(
            target: TRACING_TARGET,
            chunks = embeddings.len(),
            dimensions = embeddings.dimensions(),
            "Embedded text"
        );

        let ids = self
            .store
            .assign_ids(self.config.id_strategy, embeddings.len())
            .await
            .map_err(WorkflowError::IdAssignment)?;

        let vectors: Vec<IndexedVector> = ids
            .iter()
            .zip(embeddings.iter())
            .map(|(id, values)| {
                IndexedVector::new(id.clone(), values.to_vec()).with_metadata(metadata.clone())
            })
            .collect();

        let receipt = self
            .store
            .upsert(vectors)
            .await
            .map_err(WorkflowError::StoreWrite)?;

        tracing::debug!(
            target: TRACING_TARGET,
            first_id = ids.first().map(String::as_str).unwrap_or("-"),
            count = receipt.count,
            mutation_id = receipt.mutation_id.as_deref().unwrap_or("-"),
            "Upserted vectors"
        );

        let similar_items = self
            .query(&embeddings, &ids, top_k)
            .await
            .map_err(WorkflowError::StoreQuery)?;

        tracing::debug!(
            target: TRACING_TARGET,
            matches = similar_items.len(),
            "Queried similar items"
        );

        Ok(IndexOutcome {
            new_embedding: embeddings.first().to_vec(),
            inserted_ids: ids,
            similar_items,
        })
    }

    async fn query(
        &self,
        embeddings: &Embeddings,
        inserted: &[String],
        top_k: usize,
    ) -> Result<Vec<MatchResult>, VectorError> {
        // Over-fetch so that dropping our own vectors still leaves `top_k`,
        // bounded by the store's `topK` limit.
        let fetch = if self.config.exclude_inserted {
            (top_k + inserted.len()).min(self.config.max_top_k)
        } else {
            top_k
        };
        let options = QueryOptions::new(fetch).with_metadata();

        let mut matches = match self.config.query_mode {
            QueryMode::FirstChunk => self.store.query(embeddings.first(), &options).await?,
            QueryMode::PerChunk => {
                let mut per_chunk = Vec::with_capacity(embeddings.len());
                for vector in embeddings.iter() {
                    per_chunk.push(self.store.query(vector, &options).await?);
                }
                merge_best_scores(per_chunk)
            }
        };

        if self.config.exclude_inserted {
            let inserted: HashSet<&str> = inserted.iter().map(String::as_str).collect();
            matches.retain(|item| !inserted.contains(item.id.as_str()));
        }

        matches.truncate(top_k);
        Ok(matches)
    }
}

impl std::fmt::Debug for IndexingWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingWorkflow")
            .field("embeddings", &self.embeddings)
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

/// Keeps the highest score per ID and sorts best first.
fn merge_best_scores(results: Vec<Vec<MatchResult>>) -> Vec<MatchResult> {
    let mut best: HashMap<String, MatchResult> = HashMap::new();

    for item in results.into_iter().flatten() {
        match best.get(&item.id) {
            Some(existing) if existing.score >= item.score => {}
            _ => {
                best.insert(item.id.clone(), item);
            }
        }
    }

    let mut merged: Vec<MatchResult> = best.into_values().collect();
    merged.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tandem_core::ErrorKind;
    use tandem_inference::mock::MockProvider;
    use tandem_vector::memory::MemoryBackend;
    use tandem_vector::{
        IdStrategy, IndexDescription, UpsertReceipt, VectorResult, VectorStoreBackend,
    };
    use tokio::sync::Barrier;

    use super::*;

    fn item(id: &str, score: f32) -> MatchResult {
        MatchResult {
            id: id.to_owned(),
            score,
            metadata: Metadata::new(),
            values: None,
            namespace: None,
        }
    }

    fn workflow(
        provider: MockProvider,
        backend: impl VectorStoreBackend + 'static,
        config: WorkflowConfig,
    ) -> IndexingWorkflow {
        IndexingWorkflow::new(
            EmbeddingService::new(provider),
            VectorStore::new(backend),
            config,
        )
        .unwrap()
    }

    async fn seed(backend: &MemoryBackend, count: usize, dimensions: usize) -> anyhow::Result<()> {
        let vectors = (0..count)
            .map(|i| {
                let mut values = vec![0.0; dimensions];
                values[i % dimensions] = 1.0;
                IndexedVector::new(i.to_string(), values)
            })
            .collect();
        backend.upsert(vectors).await?;
        Ok(())
    }

    /// Memory store whose query always fails.
    #[derive(Clone, Default)]
    struct QueryFails(MemoryBackend);

    #[async_trait]
    impl VectorStoreBackend for QueryFails {
        fn backend_name(&self) -> &'static str {
            "query-fails"
        }

        async fn describe(&self) -> VectorResult<IndexDescription> {
            self.0.describe().await
        }

        async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt> {
            self.0.upsert(vectors).await
        }

        async fn query(&self, _: &[f32], _: &QueryOptions) -> VectorResult<Vec<MatchResult>> {
            Err(VectorError::connection("index unavailable"))
        }
    }

    /// Memory store that holds every `describe` until `parties` callers arrived.
    #[derive(Clone)]
    struct DescribeBarrier {
        inner: MemoryBackend,
        barrier: Arc<Barrier>,
        upserts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VectorStoreBackend for DescribeBarrier {
        fn backend_name(&self) -> &'static str {
            "describe-barrier"
        }

        async fn describe(&self) -> VectorResult<IndexDescription> {
            let description = self.inner.describe().await?;
            self.barrier.wait().await;
            Ok(description)
        }

        async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(vectors).await
        }

        async fn query(
            &self,
            vector: &[f32],
            options: &QueryOptions,
        ) -> VectorResult<Vec<MatchResult>> {
            self.inner.query(vector, options).await
        }

        async fn reserve_ids(&self, count: usize) -> VectorResult<u64> {
            self.inner.reserve_ids(count).await
        }

        fn supports_reservation(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn ids_start_at_vector_count() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        seed(&backend, 42, 768).await?;

        let workflow = workflow(
            MockProvider::default(),
            backend.clone(),
            WorkflowConfig::default(),
        );
        let metadata = Metadata::new()
            .with("text", "hello world")
            .with("email", "a@b.com");

        let outcome = workflow
            .index_and_search("hello world", metadata.clone(), 10)
            .await?;

        assert_eq!(outcome.inserted_ids, ["42"]);
        assert_eq!(outcome.new_embedding.len(), 768);
        assert!(outcome.similar_items.len() <= 10);

        let stored = backend.get("42").await.unwrap();
        assert_eq!(stored.metadata, metadata);
        assert_eq!(stored.values, outcome.new_embedding);
        Ok(())
    }

    #[tokio::test]
    async fn chunked_input_gets_increasing_ids_and_shared_metadata() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        seed(&backend, 3, 8).await?;

        let workflow = workflow(
            MockProvider::new(8).with_chunks(3),
            backend.clone(),
            WorkflowConfig::default(),
        );
        let metadata = Metadata::new().with("text", "long text");

        let outcome = workflow
            .index_and_search("long text", metadata.clone(), 10)
            .await?;

        assert_eq!(outcome.inserted_ids, ["3", "4", "5"]);
        for id in &outcome.inserted_ids {
            assert_eq!(backend.get(id).await.unwrap().metadata, metadata);
        }
        Ok(())
    }

    #[tokio::test]
    async fn repeated_runs_do_not_collide() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        let workflow = workflow(MockProvider::new(8), backend.clone(), WorkflowConfig::default());

        let first = workflow.index_and_search("same", Metadata::new(), 10).await?;
        let second = workflow.index_and_search("same", Metadata::new(), 10).await?;

        assert_ne!(first.inserted_ids, second.inserted_ids);
        assert_eq!(backend.len().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn embedding_failure_skips_the_store() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        let workflow = workflow(
            MockProvider::new(8).failing(ErrorKind::ExternalError),
            backend.clone(),
            WorkflowConfig::default(),
        );

        let error = workflow
            .index_and_search("text", Metadata::new(), 10)
            .await
            .unwrap_err();

        assert!(matches!(error, WorkflowError::EmbeddingProvider(_)));
        assert_eq!(error.step(), "embed");
        assert!(backend.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn failed_query_keeps_the_upsert() -> anyhow::Result<()> {
        let backend = QueryFails::default();
        let workflow = workflow(MockProvider::new(8), backend.clone(), WorkflowConfig::default());

        let error = workflow
            .index_and_search("text", Metadata::new(), 10)
            .await
            .unwrap_err();

        assert!(matches!(error, WorkflowError::StoreQuery(_)));
        assert_eq!(error.step(), "query");
        assert_eq!(backend.describe().await?.vector_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_vector_count_runs_collide() -> anyhow::Result<()> {
        let backend = DescribeBarrier {
            inner: MemoryBackend::default(),
            barrier: Arc::new(Barrier::new(2)),
            upserts: Arc::new(AtomicUsize::new(0)),
        };
        let workflow = workflow(MockProvider::new(8), backend.clone(), WorkflowConfig::default());

        let (first, second) = tokio::join!(
            workflow.index_and_search("first", Metadata::new(), 10),
            workflow.index_and_search("second", Metadata::new(), 10),
        );

        assert_eq!(first?.inserted_ids, second?.inserted_ids);
        assert_eq!(backend.upserts.load(Ordering::SeqCst), 2);
        assert_eq!(backend.inner.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_reserved_and_uuid_runs_never_collide() -> anyhow::Result<()> {
        for strategy in [IdStrategy::Reserved, IdStrategy::Uuid] {
            let backend = DescribeBarrier {
                inner: MemoryBackend::default(),
                barrier: Arc::new(Barrier::new(2)),
                upserts: Arc::new(AtomicUsize::new(0)),
            };
            let config = WorkflowConfig::default().with_id_strategy(strategy);
            let workflow = workflow(MockProvider::new(8), backend.clone(), config);

            let (first, second) = tokio::join!(
                workflow.index_and_search("first", Metadata::new(), 10),
                workflow.index_and_search("second", Metadata::new(), 10),
            );

            assert_ne!(first?.inserted_ids, second?.inserted_ids);
            assert_eq!(backend.inner.len().await, 2);
        }
        Ok(())
    }

    #[tokio::test]
    async fn exclude_inserted_drops_own_ids() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        seed(&backend, 4, 8).await?;
        let config = WorkflowConfig::default().with_exclude_inserted(true);
        let workflow = workflow(MockProvider::new(8), backend, config);

        let outcome = workflow.index_and_search("text", Metadata::new(), 2).await?;

        assert_eq!(outcome.similar_items.len(), 2);
        assert!(
            outcome
                .similar_items
                .iter()
                .all(|item| !outcome.inserted_ids.contains(&item.id))
        );
        Ok(())
    }

    #[tokio::test]
    async fn exclude_inserted_over_fetch_stops_at_max_top_k() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        seed(&backend, 30, 8).await?;
        let config = WorkflowConfig::default().with_exclude_inserted(true);
        let max_top_k = config.max_top_k;
        let workflow = workflow(MockProvider::new(8), backend, config);

        let outcome = workflow
            .index_and_search("text", Metadata::new(), max_top_k)
            .await?;

        assert_eq!(outcome.similar_items.len(), max_top_k - 1);
        assert!(
            outcome
                .similar_items
                .iter()
                .all(|item| !outcome.inserted_ids.contains(&item.id))
        );
        Ok(())
    }

    #[tokio::test]
    async fn first_chunk_mode_returns_own_vector() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        let workflow = workflow(MockProvider::new(8), backend, WorkflowConfig::default());

        let outcome = workflow.index_and_search("text", Metadata::new(), 10).await?;

        assert_eq!(outcome.similar_items[0].id, outcome.inserted_ids[0]);
        Ok(())
    }

    #[tokio::test]
    async fn per_chunk_mode_respects_top_k() -> anyhow::Result<()> {
        let backend = MemoryBackend::default();
        seed(&backend, 8, 8).await?;
        let config = WorkflowConfig::default().with_query_mode(QueryMode::PerChunk);
        let workflow = workflow(MockProvider::new(8).with_chunks(3), backend, config);

        let outcome = workflow.index_and_search("text", Metadata::new(), 4).await?;

        assert_eq!(outcome.similar_items.len(), 4);
        let scores: Vec<f32> = outcome.similar_items.iter().map(|m| m.score).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
        Ok(())
    }

    #[test]
    fn merge_keeps_best_score_per_id() {
        let merged = merge_best_scores(vec![
            vec![item("a", 0.4), item("b", 0.9)],
            vec![item("a", 0.8), item("c", 0.1)],
        ]);

        let ids: Vec<_> = merged.iter().map(|m| (m.id.as_str(), m.score)).collect();
        assert_eq!(ids, [("b", 0.9), ("a", 0.8), ("c", 0.1)]);
    }

    #[test]
    fn reserved_strategy_needs_backend_support() {
        let config = WorkflowConfig::default().with_id_strategy(IdStrategy::Reserved);
        let result = IndexingWorkflow::new(
            EmbeddingService::new(MockProvider::default()),
            VectorStore::new(QueryFails::default()),
            config,
        );

        assert!(matches!(result, Err(WorkflowError::IdAssignment(_))));
    }

    #[tokio::test]
    async fn top_k_out_of_range_is_rejected_before_embedding() -> anyhow::Result<()> {
        let provider = MockProvider::new(8);
        let workflow = workflow(provider.clone(), MemoryBackend::default(), WorkflowConfig::default());

        let error = workflow
            .index_and_search("text", Metadata::new(), 0)
            .await
            .unwrap_err();

        assert!(matches!(error, WorkflowError::Validation(_)));
        assert_eq!(provider.calls(), 0);
        Ok(())
    }
}
