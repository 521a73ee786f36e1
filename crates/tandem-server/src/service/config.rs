//! Indexing workflow configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tandem_vector::{DEFAULT_TOP_K, IdStrategy};

use crate::service::WorkflowError;

/// Upper bound on `topK` accepted from callers.
///
/// Vectorize caps `topK` at 20 when metadata is returned.
pub const DEFAULT_MAX_TOP_K: usize = 20;

/// Which embeddings of a chunked input are used for the similarity query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum QueryMode {
    /// Query with the first embedding only.
    #[default]
    FirstChunk,
    /// Query with every embedding and keep the best score per ID.
    PerChunk,
}

/// Indexing workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct WorkflowConfig {
    /// Number of similar items returned when the request has no `topK`
    #[cfg_attr(
        feature = "config",
        arg(long = "top-k", env = "TOP_K", default_value_t = DEFAULT_TOP_K)
    )]
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Largest `topK` a request may ask for
    #[cfg_attr(
        feature = "config",
        arg(long = "max-top-k", env = "MAX_TOP_K", default_value_t = DEFAULT_MAX_TOP_K)
    )]
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// How IDs are assigned to new vectors
    #[cfg_attr(
        feature = "config",
        arg(
            long = "id-strategy",
            env = "ID_STRATEGY",
            value_enum,
            default_value_t = IdStrategy::VectorCount
        )
    )]
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Which embeddings are used to find similar items
    #[cfg_attr(
        feature = "config",
        arg(
            long = "query-mode",
            env = "QUERY_MODE",
            value_enum,
            default_value_t = QueryMode::FirstChunk
        )
    )]
    #[serde(default)]
    pub query_mode: QueryMode,

    /// Remove the vectors written by a request from its own results
    ///
    /// The query over-fetches by the number of inserted vectors but never
    /// past `max_top_k`, so a request asking for `max_top_k` items may get
    /// fewer once its own vectors are dropped.
    #[cfg_attr(
        feature = "config",
        arg(long = "exclude-inserted", env = "EXCLUDE_INSERTED")
    )]
    #[serde(default)]
    pub exclude_inserted: bool,

    /// Reject requests without an `email`
    #[cfg_attr(feature = "config", arg(long = "require-email", env = "REQUIRE_EMAIL"))]
    #[serde(default)]
    pub require_email: bool,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_top_k() -> usize {
    DEFAULT_MAX_TOP_K
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_top_k: DEFAULT_MAX_TOP_K,
            id_strategy: IdStrategy::default(),
            query_mode: QueryMode::default(),
            exclude_inserted: false,
            require_email: false,
        }
    }
}

impl WorkflowConfig {
    /// Sets the ID strategy.
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Sets the query mode.
    pub fn with_query_mode(mut self, query_mode: QueryMode) -> Self {
        self.query_mode = query_mode;
        self
    }

    /// Removes freshly inserted vectors from results.
    pub fn with_exclude_inserted(mut self, exclude_inserted: bool) -> Self {
        self.exclude_inserted = exclude_inserted;
        self
    }

    /// Requires an e-mail address on every request.
    pub fn with_require_email(mut self, require_email: bool) -> Self {
        self.require_email = require_email;
        self
    }

    /// Sets the default and maximum `topK`.
    pub fn with_top_k(mut self, top_k: usize, max_top_k: usize) -> Self {
        self.top_k = top_k;
        self.max_top_k = max_top_k;
        self
    }

    /// Checks that the `topK` bounds are consistent.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.max_top_k == 0 {
            return Err(WorkflowError::Validation(
                "max top-k must be at least 1".to_owned(),
            ));
        }

        if self.top_k == 0 || self.top_k > self.max_top_k {
            return Err(WorkflowError::Validation(format!(
                "top-k {} must be between 1 and {}",
                self.top_k, self.max_top_k
            )));
        }

        Ok(())
    }
}
