//! Response bodies.

use serde::{Deserialize, Serialize};
use tandem_core::Metadata;
use tandem_vector::MatchResult;

use crate::service::IndexOutcome;

/// Successful indexer response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResponse {
    /// Always `true`; failures are plain-text responses.
    pub success: bool,
    /// First embedding of the request text.
    pub new_embedding: Vec<f32>,
    /// Nearest neighbours, best first.
    pub similar_items: Vec<SimilarItem>,
}

/// A nearest neighbour as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

impl From<MatchResult> for SimilarItem {
    fn from(item: MatchResult) -> Self {
        Self {
            id: item.id,
            score: item.score,
            metadata: item.metadata,
        }
    }
}

impl From<IndexOutcome> for IndexResponse {
    fn from(outcome: IndexOutcome) -> Self {
        Self {
            success: true,
            new_embedding: outcome.new_embedding,
            similar_items: outcome
                .similar_items
                .into_iter()
                .map(SimilarItem::from)
                .collect(),
        }
    }
}

/// Tool host liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub tools: usize,
    pub processes: usize,
}
