#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod memory;
pub mod vectorize;

mod config;
mod error;
mod ids;
mod store;

pub use config::{MemoryConfig, VectorBackendKind, VectorStoreConfig, VectorizeConfig};
pub use error::{VectorError, VectorResult};
pub use ids::IdStrategy;
pub use store::{
    DEFAULT_TOP_K, IndexDescription, IndexedVector, MatchResult, QueryOptions, UpsertReceipt,
    VectorStore, VectorStoreBackend,
};

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "tandem_vector";
