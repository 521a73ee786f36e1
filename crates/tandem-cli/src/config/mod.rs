//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig      # Host, port, timeouts, shutdown
//! ├── http: ReqwestConfig       # Outbound HTTP client
//! └── command
//!     ├── indexer: IndexerArgs  # Cloudflare, Workers AI, vector store, workflow
//!     └── tools: ToolsArgs      # Linkd, Vapi, Magic Loops, indexer URL
//! ```
//!
//! Every option can be provided as a CLI argument or an environment
//! variable. Use `--help` to list them.

mod server;
mod service;

use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
pub use service::{IndexerArgs, ToolsArgs};
use tandem_reqwest::ReqwestConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "tandem")]
#[command(about = "Embedding indexer and agent tool host")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Outbound HTTP client configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, env = "LOG_JSON", global = true)]
    #[serde(default)]
    pub log_json: bool,

    /// Service to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Services the binary can run.
#[derive(Debug, Clone, Subcommand, Serialize, Deserialize)]
pub enum Command {
    /// Run the embedding indexer.
    Indexer(IndexerArgs),
    /// Run the agent tool host.
    Tools(ToolsArgs),
}

impl Command {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Indexer(_) => "indexer",
            Self::Tools(_) => "tools",
        }
    }
}

impl Cli {
    /// Loads `.env` (if enabled) and parses CLI arguments.
    ///
    /// The `.env` file is loaded first so clap can read its values through
    /// the `env` attribute of each argument.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing, filtered by `RUST_LOG` (default `info`).
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        if self.log_json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;

        if let Command::Indexer(args) = &self.command {
            args.validate().context("invalid indexer configuration")?;
        }

        Ok(())
    }

    /// Logs the configuration without secrets.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.server.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            command = self.command.name(),
            http_timeout_secs = self.http.http_timeout,
            "Service configuration"
        );

        match &self.command {
            Command::Indexer(args) => args.log(),
            Command::Tools(args) => args.log(),
        }
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
