#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;

pub mod draft_email;
pub mod indexer;
pub mod linkd;
pub mod magic_loops;
pub mod process;
pub mod tool;
pub mod vapi;

pub use config::ToolsConfig;
pub use error::{ToolError, ToolResult};
pub use draft_email::{DRAFT_EMAIL, DraftEmailTool, EmailDraft};
pub use indexer::{GENERATE_EMBEDDINGS, GenerateEmbeddingsTool, IndexerClientConfig};
pub use linkd::{LinkdConfig, SEARCH_USERS, SearchUsersTool};
pub use magic_loops::{FIND_EMAIL, FindEmailTool, MagicLoopsConfig};
pub use process::{ProcessHandle, ProcessId, ProcessManager, ProcessSnapshot, ProcessState};
pub use tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};
pub use vapi::{CALL_VAPI, CallVapiTool, VapiClient, VapiConfig};

/// Tracing target for tool invocations.
pub const TRACING_TARGET: &str = "tandem_tools";
