#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod workers;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

mod embeddings;
mod service;

pub use embeddings::Embeddings;
pub use service::{EmbeddingProvider, EmbeddingService};
pub use tandem_core::{Error, ErrorKind, Result};
pub use workers::{WorkersAiConfig, WorkersAiProvider};

/// Tracing target for inference operations.
pub const TRACING_TARGET: &str = "tandem_inference";
