//! Application state, configuration and the indexing workflow.

mod config;
mod indexing;
mod state;

pub use crate::service::config::{DEFAULT_MAX_TOP_K, QueryMode, WorkflowConfig};
pub use crate::service::indexing::{IndexOutcome, IndexingWorkflow, WorkflowError};
pub use crate::service::state::{IndexerState, ToolHostState};
