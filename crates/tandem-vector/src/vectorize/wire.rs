//! Vectorize v2 request and response bodies.

use serde::{Deserialize, Serialize};
use tandem_core::Metadata;

use crate::store::{IndexedVector, MatchResult};

/// `GET /info` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IndexInfo {
    #[serde(default)]
    pub dimensions: Option<usize>,
    #[serde(default)]
    pub vector_count: u64,
}

/// One NDJSON line of an upsert body.
#[derive(Debug, Serialize)]
pub(super) struct UpsertLine<'a> {
    pub id: &'a str,
    pub values: &'a [f32],
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

impl<'a> UpsertLine<'a> {
    pub fn new(vector: &'a IndexedVector, default_namespace: Option<&'a str>) -> Self {
        Self {
            id: &vector.id,
            values: &vector.values,
            metadata: &vector.metadata,
            namespace: vector.namespace.as_deref().or(default_namespace),
        }
    }
}

/// `POST /upsert` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MutationResult {
    #[serde(default)]
    pub mutation_id: Option<String>,
}

/// `POST /query` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QueryBody<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    pub return_values: bool,
    pub return_metadata: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
}

/// `POST /query` result.
#[derive(Debug, Deserialize)]
pub(super) struct QueryResult {
    #[serde(default)]
    pub matches: Vec<MatchResult>,
}
