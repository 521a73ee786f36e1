//! The embedding indexer endpoint.
//!
//! Every path and method reaches [`index`]; routing happens inside the
//! handler so that favicon requests and non-`POST` methods are answered
//! before the body is looked at.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::{Json, Router};

use crate::handler::request::{IndexRequest, RequestRules};
use crate::handler::response::IndexResponse;
use crate::handler::{ErrorKind, Result};
use crate::service::{IndexerState, IndexingWorkflow};

/// Tracing target for indexer requests.
const TRACING_TARGET: &str = "tandem_server::handler::indexer";

#[tracing::instrument(skip_all, fields(method = %method, path = uri.path()))]
async fn index(
    State(workflow): State<IndexingWorkflow>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<IndexResponse>> {
    if uri.path().starts_with("/favicon") {
        return Err(ErrorKind::NotFound.into_error());
    }

    if method != Method::POST {
        tracing::debug!(target: TRACING_TARGET, "Rejected non-POST request");
        return Err(ErrorKind::MethodNotAllowed.into_error());
    }

    let config = workflow.config();
    let rules = RequestRules {
        require_email: config.require_email,
        max_top_k: config.max_top_k,
    };

    let request = IndexRequest::parse(&body, rules).inspect_err(|error| {
        tracing::debug!(
            target: TRACING_TARGET,
            error = %error,
            "Rejected invalid request"
        );
    })?;

    let top_k = request.top_k.unwrap_or(config.top_k);
    let outcome = workflow
        .index_and_search(&request.text, request.vector_metadata(), top_k)
        .await?;

    Ok(Json(outcome.into()))
}

/// Returns the indexer [`Router`]; it answers every path.
pub fn routes(state: IndexerState) -> Router {
    Router::new().fallback(index).with_state(state)
}
