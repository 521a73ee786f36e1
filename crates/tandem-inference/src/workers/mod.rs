//! Cloudflare Workers AI provider.

mod config;
mod provider;

pub use config::{DEFAULT_EMBEDDING_MODEL, WorkersAiConfig};
pub use provider::WorkersAiProvider;
