//! Listener configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;
use crate::server::SiblingPolicy;

/// Network binding and lifecycle configuration of both listeners.
///
/// # Environment Variables
///
/// - `HOST` - Address both listeners bind to (default: 127.0.0.1)
/// - `HTTP_SERVER_PORT` - HTTP listener port (default: 3333)
/// - `CONNECT_RPC_SERVER_PORT` - RPC listener port (default: 5555)
/// - `SHUTDOWN_TIMEOUT` - Graceful shutdown ceiling in seconds (default: 30, max: 300)
/// - `IDLE_TIMEOUT` - Keep-alive idle limit in seconds (default: 120, max: 300)
/// - `CANCEL_SIBLINGS` - Abort the other listener once one stops (default: false)
///
/// # Examples
///
/// ```bash
/// streamer --host 0.0.0.0 --port 8080 --rpc-port 8081
///
/// HOST=0.0.0.0 HTTP_SERVER_PORT=8080 CONNECT_RPC_SERVER_PORT=8081 streamer
/// ```
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Host address to bind the listeners to.
    ///
    /// Use "127.0.0.1" for localhost only, "0.0.0.0" for all interfaces.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// TCP port of the HTTP listener.
    ///
    /// Must be in the range 1024-65535.
    #[arg(short = 'p', long = "port", env = "HTTP_SERVER_PORT", default_value_t = 3333)]
    pub http_port: u16,

    /// TCP port of the Connect RPC listener.
    ///
    /// Must be in the range 1024-65535 and differ from the HTTP port.
    #[arg(long, env = "CONNECT_RPC_SERVER_PORT", default_value_t = 5555)]
    pub rpc_port: u16,

    /// Maximum time in seconds to drain in-flight HTTP requests on shutdown.
    ///
    /// Once it elapses the listener reports a clean stop regardless of what
    /// is still running. Valid range: 1-300 seconds.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,

    /// Seconds an HTTP connection may sit without reading or writing a byte
    /// before it is closed. Valid range: 1-300 seconds.
    #[arg(long, env = "IDLE_TIMEOUT", default_value_t = 120)]
    pub idle_timeout: u64,

    /// Abort the remaining listener once the first one stops.
    #[arg(long, env = "CANCEL_SIBLINGS", default_value_t = false)]
    #[serde(default)]
    pub cancel_siblings: bool,
}

/// Default host address for development.
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

impl ServerConfig {
    /// Validates all configuration values and returns errors for invalid settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either port is below 1024
    /// - Both listeners would bind to the same port
    /// - The shutdown or idle timeout lies outside 1-300 seconds
    pub fn validate(&self) -> AnyhowResult<()> {
        for (name, port) in [("HTTP", self.http_port), ("RPC", self.rpc_port)] {
            if port < 1024 {
                return Err(anyhow!(
                    "{name} port {port} is below 1024. Use ports 1024-65535 to avoid requiring root privileges."
                ));
            }
        }

        if self.http_port == self.rpc_port {
            return Err(anyhow!(
                "HTTP and RPC listeners cannot share port {}",
                self.http_port
            ));
        }

        if !(1..=300).contains(&self.shutdown_timeout) {
            return Err(anyhow!(
                "Shutdown timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.shutdown_timeout
            ));
        }

        if !(1..=300).contains(&self.idle_timeout) {
            return Err(anyhow!(
                "Idle timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.idle_timeout
            ));
        }

        Ok(())
    }

    /// Returns the socket address of the HTTP listener.
    #[must_use]
    pub const fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.http_port)
    }

    /// Returns the socket address of the RPC listener.
    #[must_use]
    pub const fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.rpc_port)
    }

    /// Returns the graceful shutdown ceiling as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns the connection idle limit as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    /// Returns what happens to the other listener once one stops.
    #[must_use]
    pub const fn sibling_policy(&self) -> SiblingPolicy {
        if self.cancel_siblings {
            SiblingPolicy::Cancel
        } else {
            SiblingPolicy::Detach
        }
    }

    /// Returns whether the listeners bind to all interfaces.
    #[must_use]
    pub const fn binds_to_all_interfaces(&self) -> bool {
        match self.host {
            IpAddr::V4(addr) => addr.is_unspecified(),
            IpAddr::V6(addr) => addr.is_unspecified(),
        }
    }

    /// Logs listener configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            host = %self.host,
            http_port = self.http_port,
            rpc_port = self.rpc_port,
            shutdown_timeout_secs = self.shutdown_timeout,
            idle_timeout_secs = self.idle_timeout,
            sibling_policy = ?self.sibling_policy(),
            "Server configuration"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: 3333,
            rpc_port: 5555,
            shutdown_timeout: 30,
            idle_timeout: 120,
            cancel_siblings: false,
        }
    }
}
