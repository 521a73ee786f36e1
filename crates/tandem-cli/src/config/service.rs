//! Per-command configuration and service assembly.

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use tandem_inference::{EmbeddingService, WorkersAiConfig, WorkersAiProvider};
use tandem_reqwest::ReqwestClient;
use tandem_reqwest::cloudflare::CloudflareConfig;
use tandem_server::service::{IndexerState, IndexingWorkflow, ToolHostState, WorkflowConfig};
use tandem_tools::process::DEFAULT_MAX_RETAINED_PROCESSES;
use tandem_tools::{ProcessManager, ToolRegistry, ToolsConfig};
use tandem_vector::{VectorBackendKind, VectorStore, VectorStoreConfig};

use crate::TRACING_TARGET_CONFIG;

/// Configuration of the `indexer` command.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct IndexerArgs {
    /// Cloudflare account shared by Workers AI and Vectorize.
    #[clap(flatten)]
    pub cloudflare: CloudflareConfig,

    /// Embedding model.
    #[clap(flatten)]
    pub embedding: WorkersAiConfig,

    /// Vector store backend.
    #[clap(flatten)]
    pub vector: VectorStoreConfig,

    /// Indexing workflow.
    #[clap(flatten)]
    pub workflow: WorkflowConfig,
}

impl IndexerArgs {
    /// Checks the workflow settings and the Cloudflare credentials.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.workflow.validate()?;

        if !self.cloudflare.is_configured() {
            anyhow::bail!(
                "Cloudflare account id and API token are required for embeddings; \
                 set CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN"
            );
        }

        Ok(())
    }

    /// Builds the embedding service, the vector store and the workflow.
    pub fn build_state(&self, http: &ReqwestClient) -> anyhow::Result<IndexerState> {
        let provider =
            WorkersAiProvider::new(self.cloudflare.clone(), self.embedding.clone(), http.clone())
                .context("failed to create the embedding provider")?;

        let store = VectorStore::from_config(&self.vector, &self.cloudflare, http)
            .context("failed to create the vector store")?;

        let workflow = IndexingWorkflow::new(
            EmbeddingService::new(provider),
            store,
            self.workflow.clone(),
        )
        .context("failed to create the indexing workflow")?;

        Ok(IndexerState::new(workflow))
    }

    /// Logs the indexer configuration.
    pub fn log(&self) {
        let index = match self.vector.backend {
            VectorBackendKind::Vectorize => self.vector.vectorize.index_name.as_str(),
            VectorBackendKind::Memory => "",
        };

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            embedding_model = %self.embedding.model,
            vector_backend = self.vector.backend_name(),
            vector_index = index,
            top_k = self.workflow.top_k,
            max_top_k = self.workflow.max_top_k,
            id_strategy = %self.workflow.id_strategy,
            query_mode = %self.workflow.query_mode,
            exclude_inserted = self.workflow.exclude_inserted,
            require_email = self.workflow.require_email,
            "Indexer configuration"
        );
    }
}

/// Configuration of the `tools` command.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ToolsArgs {
    /// Built-in tool settings.
    #[clap(flatten)]
    pub tools: ToolsConfig,

    /// Number of processes kept for status queries; finished ones are evicted first
    #[arg(
        long = "max-retained-processes",
        env = "MAX_RETAINED_PROCESSES",
        default_value_t = DEFAULT_MAX_RETAINED_PROCESSES
    )]
    #[serde(default = "default_max_retained_processes")]
    pub max_retained_processes: usize,
}

fn default_max_retained_processes() -> usize {
    DEFAULT_MAX_RETAINED_PROCESSES
}

impl ToolsArgs {
    /// Builds the registry and its process manager.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build_state(&self, http: &ReqwestClient) -> ToolHostState {
        let processes = ProcessManager::with_retention(self.max_retained_processes);
        let registry = ToolRegistry::with_tools(self.tools.clone(), http.clone(), processes.clone());
        ToolHostState::new(registry, processes)
    }

    /// Logs tool endpoints and which credentials are present.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            linkd_configured = !self.tools.linkd.api_key.trim().is_empty(),
            vapi_configured = self.tools.vapi.is_configured(),
            magic_loops_url = %self.tools.magic_loops.url,
            indexer_url = %self.tools.indexer.url,
            max_retained_processes = self.max_retained_processes,
            "Tool configuration"
        );
    }
}
