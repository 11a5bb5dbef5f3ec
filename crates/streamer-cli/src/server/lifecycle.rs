//! Listener lifecycle logging.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::server::{ServerResult, Transport};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Runs a listener, logging its start, uptime and outcome.
pub async fn run_transport<F>(transport: Transport, addr: SocketAddr, listener: F) -> ServerResult<()>
where
    F: Future<Output = ServerResult<()>>,
{
    let start_time = Instant::now();

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        transport = %transport,
        addr = %addr,
        "Listener starting"
    );

    let result = listener.await;
    let uptime = start_time.elapsed();

    match &result {
        Ok(()) => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                transport = %transport,
                uptime_secs = uptime.as_secs(),
                "Listener stopped"
            );
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                transport = %transport,
                error = %err,
                context = ?err.context(),
                uptime_secs = uptime.as_secs(),
                "Listener failed"
            );

            if let Some(suggestion) = err.suggestion() {
                tracing::info!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    suggestion = suggestion,
                    "Recovery suggestion"
                );
            }
        }
    }

    result
}

/// Logs warnings for potentially unsafe configurations.
pub fn log_security_warnings(config: &ServerConfig) {
    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Listeners bound to all interfaces, ensure firewall is configured"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::server::ServerError;

    const ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3333);

    #[tokio::test]
    async fn passes_clean_stop_through() {
        let result = run_transport(Transport::Http, ADDR, async { Ok(()) }).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn passes_failure_through() {
        let result = run_transport(Transport::Rpc, ADDR, async {
            Err(ServerError::Runtime(io::Error::other("test error")))
        })
        .await;

        assert!(matches!(result, Err(ServerError::Runtime(_))));
    }
}
