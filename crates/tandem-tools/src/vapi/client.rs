//! Minimal Vapi REST client.

use serde::{Deserialize, Serialize};
use tandem_core::{Error, Result};
use tandem_reqwest::ReqwestClient;

use super::VapiConfig;
use crate::TRACING_TARGET;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCallRequest<'a> {
    assistant_id: &'a str,
    customer: Customer<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Customer<'a> {
    number: &'a str,
}

/// A call created by Vapi.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Call {
    /// Vapi call id.
    pub id: String,
    /// Call status reported at creation, such as `queued`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Starts outbound calls through Vapi.
#[derive(Debug, Clone)]
pub struct VapiClient {
    http: ReqwestClient,
    config: VapiConfig,
}

impl VapiClient {
    /// Creates a client.
    pub fn new(config: VapiConfig, http: ReqwestClient) -> Self {
        Self { http, config }
    }

    /// Starts an outbound call to `number` handled by the configured assistant.
    pub async fn create_call(&self, number: &str) -> Result<Call> {
        if !self.config.is_configured() {
            return Err(Error::configuration()
                .with_message("Missing Vapi configuration: API key and assistant id are required"));
        }

        let body = CreateCallRequest {
            assistant_id: &self.config.assistant_id,
            customer: Customer { number },
            phone_number_id: self.config.phone_number_id.as_deref(),
        };

        let request = self
            .http
            .post(self.config.call_url())
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let call: Call = self.http.send_json(request).await?;

        tracing::info!(
            target: TRACING_TARGET,
            call_id = %call.id,
            status = call.status.as_deref().unwrap_or("-"),
            "Vapi call created"
        );

        Ok(call)
    }
}
