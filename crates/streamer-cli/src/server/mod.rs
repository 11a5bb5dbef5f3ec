//! Listener startup, supervision and shutdown.
//!
//! The HTTP and RPC listeners run on separate tasks under a
//! [`TransportSupervisor`]. The first listener to stop, cleanly or with an
//! error, decides the outcome of [`serve`].

mod error;
mod http_server;
mod lifecycle;
mod listener;
mod rpc_server;
mod shutdown;
mod supervisor;

use axum::Router;
use futures::FutureExt;

pub use crate::server::error::{ServerError, ServerResult};
use crate::server::http_server::serve_http;
use crate::server::lifecycle::{log_security_warnings, run_transport};
use crate::server::rpc_server::serve_rpc;
use crate::server::shutdown::shutdown_signal;
pub use crate::server::supervisor::{SiblingPolicy, Transport, TransportResult, TransportSupervisor};
use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::config::ServerConfig;

/// Runs the HTTP and RPC listeners until the first one stops.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, or the error of the
/// first listener that failed (binding included).
pub async fn serve(http: Router, rpc: Router, config: &ServerConfig) -> ServerResult<()> {
    config
        .validate()
        .map_err(|err| ServerError::invalid_config(&err))?;

    log_security_warnings(config);

    let http_addr = config.http_addr();
    let rpc_addr = config.rpc_addr();

    let http_listener = run_transport(
        Transport::Http,
        http_addr,
        serve_http(
            http_addr,
            http,
            config.idle_timeout(),
            config.shutdown_timeout(),
            shutdown_signal(),
        ),
    );
    let rpc_listener = run_transport(Transport::Rpc, rpc_addr, serve_rpc(rpc_addr, rpc));

    let supervisor = TransportSupervisor::start(
        config.sibling_policy(),
        [
            (Transport::Http, http_listener.boxed()),
            (Transport::Rpc, rpc_listener.boxed()),
        ],
    );

    let TransportResult { transport, outcome } = supervisor.wait().await?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        transport = %transport,
        clean = outcome.is_ok(),
        "First listener stopped"
    );

    outcome
}
