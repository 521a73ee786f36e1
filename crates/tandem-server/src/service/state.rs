//! Application state and dependency injection.

use tandem_tools::{ProcessManager, ToolRegistry};

use crate::service::IndexingWorkflow;

/// State of the embedding indexer.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct IndexerState {
    workflow: IndexingWorkflow,
}

impl IndexerState {
    /// Creates the indexer state.
    pub fn new(workflow: IndexingWorkflow) -> Self {
        Self { workflow }
    }
}

/// State of the tool host.
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ToolHostState {
    registry: ToolRegistry,
    processes: ProcessManager,
}

impl ToolHostState {
    /// Creates the tool host state.
    ///
    /// `processes` must be the manager the registered tools spawn on.
    pub fn new(registry: ToolRegistry, processes: ProcessManager) -> Self {
        Self {
            registry,
            processes,
        }
    }
}

impl std::fmt::Debug for ToolHostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHostState")
            .field("tools", &self.registry.len())
            .field("processes", &self.processes)
            .finish()
    }
}

macro_rules! impl_di {
    ($s:ty => $($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<$s> for $t {
            fn from_ref(state: &$s) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(IndexerState => workflow: IndexingWorkflow);

impl_di!(ToolHostState => registry: ToolRegistry);
impl_di!(ToolHostState => processes: ProcessManager);
