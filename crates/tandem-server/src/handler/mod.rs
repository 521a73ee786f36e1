//! HTTP handlers of the indexer and the tool host.
//!
//! Both services answer errors as plain text. Workflow failures carry the
//! failed step in the [`FAILED_STEP_HEADER`] header.

mod error;
mod indexer;
mod request;
mod response;
mod tools;

use axum::Router;

pub use crate::handler::error::{Error, ErrorKind, FAILED_STEP_HEADER, Result};
pub use crate::handler::request::{IndexRequest, RequestRules, ValidationError};
pub use crate::handler::response::{HealthResponse, IndexResponse, SimilarItem};
use crate::service::{IndexerState, ToolHostState};

/// Returns the indexer [`Router`]: every path is served by the same handler.
pub fn indexer_routes(state: IndexerState) -> Router {
    indexer::routes(state)
}

/// Returns the tool host [`Router`].
pub fn tool_routes(state: ToolHostState) -> Router {
    tools::routes(state)
}
