//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, ports, shutdown, sibling policy
//! ├── middleware: MiddlewareConfig # Request deadline, body timeouts
//! └── service: ServiceConfig       # Object store, compression threshold
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! ```bash
//! streamer --storage-backend fs --storage-root ./files --port 8080
//!
//! STORAGE_BACKEND=fs STORAGE_ROOT=./files HTTP_SERVER_PORT=8080 streamer
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use streamer_server::service::ServiceConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
///
/// Combines all configuration groups of the streamer:
/// - [`ServerConfig`]: Listener binding and lifecycle
/// - [`MiddlewareConfig`]: Request deadline and body timeouts
/// - [`ServiceConfig`]: Object store connection and compression
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "streamer")]
#[command(about = "Range-aware file streaming over HTTP and Connect RPC")]
#[command(version)]
pub struct Cli {
    /// Listener network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Middleware configuration (deadlines, body timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Object store and compression configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments, so its values
    /// act as environment defaults.
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

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.service.storage_backend,
            bucket = %self.service.bucket,
            endpoint = %self.service.storage_endpoint,
            use_ssl = self.service.use_ssl,
            min_compression_size = self.service.min_compression_size,
            "Service configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use streamer_server::service::StorageBackend;

    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["streamer"]).unwrap();
        assert_eq!(cli.server.http_port, 3333);
        assert_eq!(cli.server.rpc_port, 5555);
        assert_eq!(cli.server.shutdown_timeout, 30);
        assert_eq!(cli.middleware.recovery.request_timeout, 30);
        assert_eq!(cli.middleware.timeouts.read_timeout, 5);
        assert_eq!(cli.middleware.timeouts.write_timeout, 10);
        assert_eq!(cli.service.storage_backend, StorageBackend::S3);
        assert_eq!(cli.service.min_compression_size, 8192);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "streamer",
            "--port",
            "8080",
            "--rpc-port",
            "8081",
            "--storage-backend",
            "memory",
            "--cancel-siblings",
        ])
        .unwrap();

        assert_eq!(cli.server.http_port, 8080);
        assert_eq!(cli.server.rpc_port, 8081);
        assert!(cli.server.cancel_siblings);
        assert_eq!(cli.service.storage_backend, StorageBackend::Memory);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn rejects_conflicting_ports() {
        let cli = Cli::try_parse_from(["streamer", "--port", "4000", "--rpc-port", "4000"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
