//! Linkd API configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default Linkd API base URL.
pub const DEFAULT_LINKD_API_URL: &str = "https://search.linkd.inc/api";

/// Linkd people-search credentials.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct LinkdConfig {
    /// Linkd API key
    #[cfg_attr(
        feature = "config",
        arg(
            id = "linkd-api-key",
            long = "linkd-api-key",
            env = "LINKD_API_KEY",
            default_value = ""
        )
    )]
    #[serde(default)]
    pub api_key: String,

    /// Linkd API base URL
    #[cfg_attr(
        feature = "config",
        arg(
            id = "linkd-api-url",
            long = "linkd-api-url",
            env = "LINKD_API_URL",
            default_value = DEFAULT_LINKD_API_URL
        )
    )]
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_LINKD_API_URL.to_owned()
}

impl Default for LinkdConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: default_api_url(),
        }
    }
}

impl std::fmt::Debug for LinkdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkdConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl LinkdConfig {
    /// Creates a configuration for the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// URL of the user search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/search/users", self.api_url.trim_end_matches('/'))
    }
}
