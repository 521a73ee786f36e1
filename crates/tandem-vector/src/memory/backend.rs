//! In-memory backend implementation.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MemoryConfig, cosine_similarity};
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{
    IndexDescription, IndexedVector, MatchResult, QueryOptions, UpsertReceipt, VectorStoreBackend,
};

#[derive(Default)]
struct MemoryState {
    vectors: HashMap<String, IndexedVector>,
    dimensions: Option<usize>,
}

struct MemoryInner {
    state: RwLock<MemoryState>,
    next_id: AtomicU64,
    mutations: AtomicU64,
}

/// In-process vector store ranking matches by cosine similarity.
///
/// Clones share the same index. Useful for development and tests; nothing
/// is persisted.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    /// Creates an empty store.
    pub fn new(config: &MemoryConfig) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            dimensions = ?config.dimensions,
            "Memory backend initialized"
        );

        let state = MemoryState {
            vectors: HashMap::new(),
            dimensions: config.dimensions,
        };

        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(state),
                next_id: AtomicU64::new(0),
                mutations: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a stored vector by ID.
    pub async fn get(&self, id: &str) -> Option<IndexedVector> {
        self.inner.state.read().await.vectors.get(id).cloned()
    }

    /// Returns the number of stored vectors.
    pub async fn len(&self) -> usize {
        self.inner.state.read().await.vectors.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(&MemoryConfig::default())
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl VectorStoreBackend for MemoryBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn describe(&self) -> VectorResult<IndexDescription> {
        let state = self.inner.state.read().await;

        Ok(IndexDescription {
            vector_count: state.vectors.len() as u64,
            dimensions: state.dimensions,
        })
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt> {
        let count = vectors.len();
        let mut state = self.inner.state.write().await;

        // Validate the whole batch before touching the index.
        let mut dimensions = state.dimensions;
        for vector in &vectors {
            match dimensions {
                Some(expected) if expected != vector.values.len() => {
                    return Err(VectorError::dimension_mismatch(expected, vector.values.len()));
                }
                None => dimensions = Some(vector.values.len()),
                _ => {}
            }
        }

        state.dimensions = dimensions;
        for vector in vectors {
            state.vectors.insert(vector.id.clone(), vector);
        }

        let len = state.vectors.len() as u64;
        self.inner.next_id.fetch_max(len, Ordering::SeqCst);
        let mutation = self.inner.mutations.fetch_add(1, Ordering::SeqCst);

        Ok(UpsertReceipt {
            mutation_id: Some(format!("memory-{mutation}")),
            count,
        })
    }

    async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> VectorResult<Vec<MatchResult>> {
        let state = self.inner.state.read().await;

        if let Some(expected) = state.dimensions
            && expected != vector.len()
        {
            return Err(VectorError::dimension_mismatch(expected, vector.len()));
        }

        let mut matches: Vec<MatchResult> = state
            .vectors
            .values()
            .filter(|stored| options.namespace.is_none() || stored.namespace == options.namespace)
            .map(|stored| MatchResult {
                id: stored.id.clone(),
                score: cosine_similarity(vector, &stored.values),
                metadata: if options.return_metadata {
                    stored.metadata.clone()
                } else {
                    Default::default()
                },
                values: options.return_values.then(|| stored.values.clone()),
                namespace: stored.namespace.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(options.top_k);

        Ok(matches)
    }

    async fn reserve_ids(&self, count: usize) -> VectorResult<u64> {
        let len = self.inner.state.read().await.vectors.len() as u64;
        self.inner.next_id.fetch_max(len, Ordering::SeqCst);

        Ok(self.inner.next_id.fetch_add(count as u64, Ordering::SeqCst))
    }

    fn supports_reservation(&self) -> bool {
        true
    }
}
