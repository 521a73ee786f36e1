//! Cloudflare REST API account settings and response envelope.
//!
//! Workers AI and Vectorize share the same account, token and the
//! `{ success, errors, messages, result }` envelope.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default Cloudflare REST API base URL.
pub const DEFAULT_CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare account credentials.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CloudflareConfig {
    /// Cloudflare account identifier
    #[cfg_attr(
        feature = "config",
        arg(long = "cloudflare-account-id", env = "CLOUDFLARE_ACCOUNT_ID", default_value = "")
    )]
    #[serde(default)]
    pub account_id: String,

    /// Cloudflare API token with Workers AI and Vectorize permissions
    #[cfg_attr(
        feature = "config",
        arg(long = "cloudflare-api-token", env = "CLOUDFLARE_API_TOKEN", default_value = "")
    )]
    #[serde(default)]
    pub api_token: String,

    /// Cloudflare REST API base URL
    #[cfg_attr(
        feature = "config",
        arg(
            long = "cloudflare-api-url",
            env = "CLOUDFLARE_API_URL",
            default_value = DEFAULT_CLOUDFLARE_API_URL
        )
    )]
    #[serde(default = "default_api_url")]
    pub api_url: Url,
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_CLOUDFLARE_API_URL).expect("default Cloudflare API URL is valid")
}

impl std::fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl CloudflareConfig {
    /// Creates a configuration for the public Cloudflare API.
    pub fn new(account_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_token: api_token.into(),
            api_url: default_api_url(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self
    }

    /// Returns whether both the account and the token are set.
    pub fn is_configured(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    /// Builds `{api_url}/accounts/{account_id}/{path}`.
    pub fn account_url(&self, path: &str) -> String {
        format!(
            "{}/accounts/{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            self.account_id,
            path.trim_start_matches('/')
        )
    }
}

/// A message or error entry of the Cloudflare envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Numeric error code.
    #[serde(default)]
    pub code: i64,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

/// Cloudflare v4 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Errors reported by the API.
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    /// Informational messages.
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    /// The payload.
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, failing when the API reports an error.
    pub fn into_result(self) -> Result<T> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let reason = self
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Error::Api(if reason.is_empty() {
                    "response carried no result".to_owned()
                } else {
                    reason
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn account_url_joins_segments() {
        let config = CloudflareConfig::new("acc", "token");
        assert_eq!(
            config.account_url("/vectorize/v2/indexes/users/info"),
            "https://api.cloudflare.com/client/v4/accounts/acc/vectorize/v2/indexes/users/info"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let config = CloudflareConfig::new("acc", "super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn envelope_reports_api_errors() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": false,
            "errors": [{ "code": 10000, "message": "Authentication error" }],
            "messages": [],
            "result": null,
        }))
        .unwrap();

        let error = envelope.into_result().unwrap_err();
        assert!(error.to_string().contains("Authentication error"));
    }
}
