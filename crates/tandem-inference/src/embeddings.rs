//! Validated embedding batches.

use serde::Serialize;
use tandem_core::{Error, Result};

/// One or more embeddings produced for a single input.
///
/// Always holds at least one vector; every vector is non-empty and all
/// share the same dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Embeddings {
    vectors: Vec<Vec<f32>>,
}

impl Embeddings {
    /// Validates the shape of a model response.
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(
                Error::external_error().with_message("embedding response contained no vectors")
            );
        };

        let dimensions = first.len();
        if dimensions == 0 {
            return Err(Error::external_error().with_message("embedding vector is empty"));
        }

        if let Some((index, ragged)) = vectors
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != dimensions)
        {
            return Err(Error::external_error()
                .with_message("embedding vectors have inconsistent dimensions")
                .with_context(format!(
                    "vector {index} has {} values, expected {dimensions}",
                    ragged.len()
                )));
        }

        Ok(Self { vectors })
    }

    /// The first vector; used as the query vector and echoed to callers.
    pub fn first(&self) -> &[f32] {
        &self.vectors[0]
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns whether the batch holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality shared by every vector.
    pub fn dimensions(&self) -> usize {
        self.first().len()
    }

    /// Iterates over the vectors in order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.vectors.iter().map(Vec::as_slice)
    }

    /// Consumes the batch.
    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        self.vectors
    }
}

impl IntoIterator for Embeddings {
    type IntoIter = std::vec::IntoIter<Vec<f32>>;
    type Item = Vec<f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.into_iter()
    }
}
