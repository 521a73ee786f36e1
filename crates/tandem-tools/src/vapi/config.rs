//! Vapi configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default Vapi API base URL.
pub const DEFAULT_VAPI_API_URL: &str = "https://api.vapi.ai";

/// Vapi credentials and the assistant that handles calls.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct VapiConfig {
    /// Vapi private API key
    #[cfg_attr(
        feature = "config",
        arg(id = "vapi-api-key", long = "vapi-api-key", env = "VAPI_API_KEY", default_value = "")
    )]
    #[serde(default)]
    pub api_key: String,

    /// Persistent Vapi assistant that runs the call
    #[cfg_attr(
        feature = "config",
        arg(
            id = "vapi-assistant-id",
            long = "vapi-assistant-id",
            env = "VAPI_ASSISTANT_ID",
            default_value = ""
        )
    )]
    #[serde(default)]
    pub assistant_id: String,

    /// Vapi phone number the call is placed from
    #[cfg_attr(
        feature = "config",
        arg(
            id = "vapi-phone-number-id",
            long = "vapi-phone-number-id",
            env = "VAPI_PHONE_NUMBER_ID"
        )
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number_id: Option<String>,

    /// Vapi API base URL
    #[cfg_attr(
        feature = "config",
        arg(
            id = "vapi-api-url",
            long = "vapi-api-url",
            env = "VAPI_API_URL",
            default_value = DEFAULT_VAPI_API_URL
        )
    )]
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_VAPI_API_URL.to_owned()
}

impl Default for VapiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            assistant_id: String::new(),
            phone_number_id: None,
            api_url: default_api_url(),
        }
    }
}

impl std::fmt::Debug for VapiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapiConfig")
            .field("api_key", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .field("phone_number_id", &self.phone_number_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl VapiConfig {
    /// Creates a configuration for the public API.
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            ..Self::default()
        }
    }

    /// Places calls from a specific Vapi phone number.
    #[must_use]
    pub fn with_phone_number_id(mut self, phone_number_id: impl Into<String>) -> Self {
        self.phone_number_id = Some(phone_number_id.into());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Returns whether the key and assistant are both set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.assistant_id.trim().is_empty()
    }

    /// URL of the call creation endpoint.
    pub fn call_url(&self) -> String {
        format!("{}/call", self.api_url.trim_end_matches('/'))
    }
}
