//! In-memory store configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// In-memory store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MemoryConfig {
    /// Fixed dimensionality of the in-memory index; learned from the first upsert when unset
    #[cfg_attr(
        feature = "config",
        arg(long = "memory-dimensions", env = "MEMORY_DIMENSIONS")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

impl MemoryConfig {
    /// Sets the vector dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}
