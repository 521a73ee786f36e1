//! In-process vector store backend.

mod backend;
mod config;
mod similarity;

pub use backend::MemoryBackend;
pub use config::MemoryConfig;
pub use similarity::cosine_similarity;
