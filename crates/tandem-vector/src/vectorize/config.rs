//! Vectorize index configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Vectorize index configuration.
///
/// Account credentials live in [`CloudflareConfig`], shared with Workers AI.
///
/// [`CloudflareConfig`]: tandem_reqwest::cloudflare::CloudflareConfig
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct VectorizeConfig {
    /// Name of the Vectorize index
    #[cfg_attr(
        feature = "config",
        arg(long = "vectorize-index", env = "VECTORIZE_INDEX", default_value = "")
    )]
    #[serde(default)]
    pub index_name: String,

    /// Namespace written to and queried within the index
    #[cfg_attr(
        feature = "config",
        arg(long = "vectorize-namespace", env = "VECTORIZE_NAMESPACE")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl VectorizeConfig {
    /// Creates a configuration for the given index.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            namespace: None,
        }
    }

    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}
