//! Vectorize backend implementation.

use async_trait::async_trait;
use tandem_reqwest::ReqwestClient;
use tandem_reqwest::cloudflare::{CloudflareConfig, Envelope};

use super::VectorizeConfig;
use super::wire::{IndexInfo, MutationResult, QueryBody, QueryResult, UpsertLine};
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{
    IndexDescription, IndexedVector, MatchResult, QueryOptions, UpsertReceipt, VectorStoreBackend,
};

/// Cloudflare Vectorize backend.
///
/// `vectorCount` is updated asynchronously after upserts are processed, so
/// a `describe` issued right after an upsert may still report the old count.
pub struct VectorizeBackend {
    http: ReqwestClient,
    cloudflare: CloudflareConfig,
    config: VectorizeConfig,
}

impl VectorizeBackend {
    /// Creates a new Vectorize backend.
    pub fn new(
        cloudflare: CloudflareConfig,
        config: VectorizeConfig,
        http: ReqwestClient,
    ) -> VectorResult<Self> {
        if !cloudflare.is_configured() {
            return Err(VectorError::invalid_config(
                "Cloudflare account id and API token are required for Vectorize",
            ));
        }

        if config.index_name.trim().is_empty() {
            return Err(VectorError::invalid_config("Vectorize index name is required"));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            index = %config.index_name,
            namespace = config.namespace.as_deref().unwrap_or("-"),
            "Vectorize backend initialized"
        );

        Ok(Self {
            http,
            cloudflare,
            config,
        })
    }

    fn index_url(&self, operation: &str) -> String {
        self.cloudflare.account_url(&format!(
            "vectorize/v2/indexes/{}/{operation}",
            self.config.index_name
        ))
    }
}

impl std::fmt::Debug for VectorizeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorizeBackend")
            .field("index", &self.config.index_name)
            .field("namespace", &self.config.namespace)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VectorStoreBackend for VectorizeBackend {
    fn backend_name(&self) -> &'static str {
        "vectorize"
    }

    async fn describe(&self) -> VectorResult<IndexDescription> {
        let request = self
            .http
            .get(self.index_url("info"))
            .bearer_auth(&self.cloudflare.api_token);

        let envelope: Envelope<IndexInfo> = self.http.send_json(request).await?;
        let info = envelope.into_result()?;

        Ok(IndexDescription {
            vector_count: info.vector_count,
            dimensions: info.dimensions,
        })
    }

    async fn upsert(&self, vectors: Vec<IndexedVector>) -> VectorResult<UpsertReceipt> {
        if vectors.is_empty() {
            return Ok(UpsertReceipt::default());
        }

        let namespace = self.config.namespace.as_deref();
        let mut body = String::new();
        for vector in &vectors {
            body.push_str(&serde_json::to_string(&UpsertLine::new(vector, namespace))?);
            body.push('\n');
        }

        let request = self
            .http
            .post(self.index_url("upsert"))
            .bearer_auth(&self.cloudflare.api_token)
            .header("content-type", "application/x-ndjson")
            .body(body);

        let envelope: Envelope<MutationResult> = self.http.send_json(request).await?;
        let result = envelope.into_result()?;

        Ok(UpsertReceipt {
            mutation_id: result.mutation_id,
            count: vectors.len(),
        })
    }

    async fn query(
        &self,
        vector: &[f32],
        options: &QueryOptions,
    ) -> VectorResult<Vec<MatchResult>> {
        let body = QueryBody {
            vector,
            top_k: options.top_k,
            return_values: options.return_values,
            return_metadata: if options.return_metadata { "all" } else { "none" },
            namespace: options
                .namespace
                .as_deref()
                .or(self.config.namespace.as_deref()),
        };

        let request = self
            .http
            .post(self.index_url("query"))
            .bearer_auth(&self.cloudflare.api_token)
            .json(&body);

        let envelope: Envelope<QueryResult> = self.http.send_json(request).await?;
        Ok(envelope.into_result()?.matches)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tandem_core::Metadata;
    use tandem_reqwest::ReqwestConfig;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const INDEX_PATH: &str = "/accounts/acc/vectorize/v2/indexes/users";

    async fn backend(server: &MockServer) -> anyhow::Result<VectorizeBackend> {
        let cloudflare =
            CloudflareConfig::new("acc", "token").with_api_url(server.uri().parse()?);
        let http = ReqwestClient::new(ReqwestConfig::default())?;
        Ok(VectorizeBackend::new(
            cloudflare,
            VectorizeConfig::new("users"),
            http,
        )?)
    }

    fn envelope(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
        }))
    }

    #[tokio::test]
    async fn describe_reads_vector_count() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{INDEX_PATH}/info")))
            .and(header("authorization", "Bearer token"))
            .respond_with(envelope(json!({ "dimensions": 768, "vectorCount": 42 })))
            .mount(&server)
            .await;

        let description = backend(&server).await?.describe().await?;

        assert_eq!(description.vector_count, 42);
        assert_eq!(description.dimensions, Some(768));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_sends_ndjson() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{INDEX_PATH}/upsert")))
            .and(header("content-type", "application/x-ndjson"))
            .and(body_string(
                "{\"id\":\"42\",\"values\":[0.5,0.25],\"metadata\":{\"email\":\"a@b.com\",\"text\":\"hi\"}}\n",
            ))
            .respond_with(envelope(json!({ "mutationId": "m-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let vector = IndexedVector::new("42", vec![0.5, 0.25]).with_metadata(
            Metadata::new()
                .with("text", "hi")
                .with("email", "a@b.com"),
        );
        let receipt = backend(&server).await?.upsert(vec![vector]).await?;

        assert_eq!(receipt.mutation_id.as_deref(), Some("m-1"));
        assert_eq!(receipt.count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_upsert_skips_request() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(envelope(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let receipt = backend(&server).await?.upsert(Vec::new()).await?;
        assert_eq!(receipt.count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn query_requests_metadata() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{INDEX_PATH}/query")))
            .and(body_json(json!({
                "vector": [1.0, 0.0],
                "topK": 10,
                "returnValues": false,
                "returnMetadata": "all",
            })))
            .respond_with(envelope(json!({
                "count": 2,
                "matches": [
                    { "id": "3", "score": 0.99, "metadata": { "text": "hello" } },
                    { "id": "9", "score": 0.5 },
                ],
            })))
            .mount(&server)
            .await;

        let matches = backend(&server)
            .await?
            .query(&[1.0, 0.0], &QueryOptions::new(10).with_metadata())
            .await?;

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "3");
        assert!(matches[1].metadata.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn api_failure_surfaces_as_backend_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "errors": [{ "code": 40004, "message": "index not found" }],
                "messages": [],
                "result": null,
            })))
            .mount(&server)
            .await;

        let error = backend(&server).await?.describe().await.unwrap_err();
        assert!(error.to_string().contains("index not found"));
        Ok(())
    }

    #[test]
    fn requires_credentials_and_index() {
        let http = ReqwestClient::new(ReqwestConfig::default()).unwrap();

        let missing_token = VectorizeBackend::new(
            CloudflareConfig::new("acc", ""),
            VectorizeConfig::new("users"),
            http.clone(),
        );
        assert!(matches!(missing_token, Err(VectorError::InvalidConfig(_))));

        let missing_index = VectorizeBackend::new(
            CloudflareConfig::new("acc", "token"),
            VectorizeConfig::default(),
            http,
        );
        assert!(matches!(missing_index, Err(VectorError::InvalidConfig(_))));
    }
}
