#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use streamer_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterTimeoutExt};
use streamer_server::service::ServiceState;
use streamer_server::{handler, rpc};

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "streamer_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "streamer_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "streamer_cli::config";

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
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting file streamer"
    );

    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service)
        .context("failed to create service state")?
        .with_request_timeout(cli.middleware.recovery.request_timeout());

    let http = create_http_router(state.clone(), &cli.middleware);
    let rpc = create_rpc_router(state, &cli.middleware);

    server::serve(http, rpc, &cli.server).await?;

    Ok(())
}

/// Creates the HTTP router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces the request deadline
/// 2. Observability - request IDs and tracing spans
/// 3. Body timeouts - stalled uploads and downloads
/// 4. Routes (innermost) - file streaming and health handlers
fn create_http_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    handler::routes(state)
        .with_transfer_timeouts(&middleware.timeouts)
        .with_observability()
        .with_recovery(&middleware.recovery)
}

/// Creates the Connect RPC router.
fn create_rpc_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    rpc::routes(state)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
