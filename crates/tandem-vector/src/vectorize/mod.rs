//! Cloudflare Vectorize backend (v2 REST API).

mod backend;
mod config;
mod wire;

pub use backend::VectorizeBackend;
pub use config::VectorizeConfig;
