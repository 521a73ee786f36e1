//! Workers AI model configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default text embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "@cf/baai/bge-base-en-v1.5";

/// Workers AI model selection.
///
/// Account credentials come from the shared [`CloudflareConfig`].
///
/// [`CloudflareConfig`]: tandem_reqwest::cloudflare::CloudflareConfig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkersAiConfig {
    /// Workers AI text embedding model
    #[cfg_attr(
        feature = "config",
        arg(
            long = "embedding-model",
            env = "EMBEDDING_MODEL",
            default_value = DEFAULT_EMBEDDING_MODEL
        )
    )]
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_owned()
}

impl Default for WorkersAiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

impl WorkersAiConfig {
    /// Uses a different model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
