#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use tandem_reqwest::ReqwestClient;
use tandem_server::handler::{indexer_routes, tool_routes};
use tandem_server::middleware::{RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt};

use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "tandem_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "tandem_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "tandem_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "Application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        let error = format!("{error:#}");
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command.name(),
        "Starting tandem"
    );

    cli.log();
    cli.validate()?;

    let http = ReqwestClient::new(cli.http.clone()).context("failed to create HTTP client")?;

    let routes = match &cli.command {
        Command::Indexer(args) => indexer_routes(args.build_state(&http)?),
        Command::Tools(args) => tool_routes(args.build_state(&http)),
    };

    let router = create_router(routes, &cli.server.recovery());
    server::serve(router, cli.server).await?;

    Ok(())
}

/// Applies middleware; the last layer added is the outermost.
///
/// 1. Recovery (outermost): timeouts and panics
/// 2. Observability: request IDs, tracing spans and request logs
/// 3. Routes (innermost)
fn create_router(routes: Router, recovery: &RecoveryConfig) -> Router {
    routes
        .with_request_logging()
        .with_observability()
        .with_recovery(recovery)
}
