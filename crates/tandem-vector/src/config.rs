//! Vector store configuration types.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// Re-export configs from backend modules
pub use crate::memory::MemoryConfig;
pub use crate::vectorize::VectorizeConfig;

/// Which backend serves the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VectorBackendKind {
    /// Cloudflare Vectorize.
    #[default]
    Vectorize,
    /// In-process store, lost on restart.
    Memory,
}

/// Vector store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct VectorStoreConfig {
    /// Vector store backend
    #[cfg_attr(
        feature = "config",
        arg(
            long = "vector-backend",
            env = "VECTOR_BACKEND",
            value_enum,
            default_value_t = VectorBackendKind::Vectorize
        )
    )]
    #[serde(default)]
    pub backend: VectorBackendKind,

    /// Vectorize index settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub vectorize: VectorizeConfig,

    /// In-memory store settings.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl VectorStoreConfig {
    /// Configuration for an in-memory store.
    pub fn memory() -> Self {
        Self {
            backend: VectorBackendKind::Memory,
            ..Self::default()
        }
    }

    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            VectorBackendKind::Vectorize => "vectorize",
            VectorBackendKind::Memory => "memory",
        }
    }
}
