//! Deterministic mock provider for tests.
//!
//! Only available with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! tandem-inference = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tandem_core::{Error, ErrorKind, Result, ServiceHealth};

use crate::embeddings::Embeddings;
use crate::service::EmbeddingProvider;

/// Dimensionality of `@cf/baai/bge-base-en-v1.5`, used by default.
pub const DEFAULT_MOCK_DIMENSIONS: usize = 768;

/// Mock embedding provider.
///
/// The same text always yields the same vectors. Clones share the call
/// counter, so a test can keep a clone and assert on it afterwards.
#[derive(Debug, Clone)]
pub struct MockProvider {
    dimensions: usize,
    chunks: usize,
    failure: Option<ErrorKind>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DIMENSIONS)
    }
}

impl MockProvider {
    /// Creates a provider returning one vector of `dimensions` values.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunks: 1,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `chunks` vectors per call.
    #[must_use]
    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks;
        self
    }

    /// Fails every call with an error of `kind`.
    #[must_use]
    pub fn failing(mut self, kind: ErrorKind) -> Self {
        self.failure = Some(kind);
        self
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vectors `embed` returns for `text`.
    pub fn vectors_for(&self, text: &str) -> Vec<Vec<f32>> {
        let seed = text
            .bytes()
            .fold(17_u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));

        (0..self.chunks as u64)
            .map(|chunk| {
                (0..self.dimensions as u64)
                    .map(|i| {
                        let x = seed.wrapping_add(chunk * 7919).wrapping_add(i * 104_729) % 1000;
                        (x as f32 + 1.0) / 1000.0
                    })
                    .collect()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn embed(&self, text: &str) -> Result<Embeddings> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(kind) = self.failure {
            return Err(Error::new(kind).with_message("mock provider failure"));
        }

        Embeddings::new(self.vectors_for(text))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(match self.failure {
            Some(kind) => ServiceHealth::unhealthy(format!("mock provider fails with {kind}")),
            None => ServiceHealth::healthy(),
        })
    }
}
