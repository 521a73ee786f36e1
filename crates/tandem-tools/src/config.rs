//! Aggregate configuration and registry assembly.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tandem_reqwest::ReqwestClient;

use crate::draft_email::DraftEmailTool;
use crate::indexer::{GenerateEmbeddingsTool, IndexerClientConfig};
use crate::linkd::{LinkdConfig, SearchUsersTool};
use crate::magic_loops::{FindEmailTool, MagicLoopsConfig};
use crate::process::ProcessManager;
use crate::tool::ToolRegistry;
use crate::vapi::{CallVapiTool, VapiClient, VapiConfig};

/// Configuration of every built-in tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ToolsConfig {
    /// Linkd people search.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub linkd: LinkdConfig,

    /// Vapi outbound calls.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub vapi: VapiConfig,

    /// Magic Loops e-mail lookup.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub magic_loops: MagicLoopsConfig,

    /// Embedding indexer.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub indexer: IndexerClientConfig,
}

impl ToolRegistry {
    /// Builds a registry holding the five built-in tools.
    ///
    /// Missing credentials do not prevent registration; the affected tools
    /// fail when called.
    pub fn with_tools(
        config: ToolsConfig,
        http: ReqwestClient,
        processes: ProcessManager,
    ) -> Self {
        let mut registry = Self::default();

        SearchUsersTool::new(config.linkd, http.clone()).register(&mut registry);
        FindEmailTool::new(config.magic_loops, http.clone()).register(&mut registry);
        GenerateEmbeddingsTool::new(config.indexer, http.clone()).register(&mut registry);
        DraftEmailTool.register(&mut registry);

        let vapi = VapiClient::new(config.vapi, http);
        CallVapiTool::new(vapi, processes).register(&mut registry);

        registry
    }
}

#[cfg(test)]
mod tests {
    use tandem_reqwest::ReqwestConfig;

    use super::*;
    use crate::{CALL_VAPI, DRAFT_EMAIL, FIND_EMAIL, GENERATE_EMBEDDINGS, SEARCH_USERS};

    #[tokio::test]
    async fn registers_builtin_tools() -> anyhow::Result<()> {
        let http = ReqwestClient::new(ReqwestConfig::default())?;
        let processes = ProcessManager::new();
        let registry = ToolRegistry::with_tools(ToolsConfig::default(), http, processes);

        assert_eq!(registry.len(), 5);
        let ids: Vec<_> = registry
            .definitions()
            .map(|definition| definition.id().to_owned())
            .collect();
        let mut expected = vec![
            CALL_VAPI,
            DRAFT_EMAIL,
            FIND_EMAIL,
            GENERATE_EMBEDDINGS,
            SEARCH_USERS,
        ];
        expected.sort_unstable();
        assert_eq!(ids, expected);
        Ok(())
    }
}
