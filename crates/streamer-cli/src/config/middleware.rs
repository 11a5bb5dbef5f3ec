//! Middleware configuration for the HTTP and RPC routers.
//!
//! ```bash
//! streamer --request-timeout 60 --read-timeout 5 --write-timeout 10
//! ```

use anyhow::{Context, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};
use streamer_server::middleware::{RecoveryConfig, TransferTimeoutConfig};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration combining recovery and body timeout settings.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Recovery middleware configuration.
    ///
    /// Controls the per-request deadline and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Body read and write limits of the HTTP listener.
    #[clap(flatten)]
    pub timeouts: TransferTimeoutConfig,
}

impl MiddlewareConfig {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=300).contains(&self.recovery.request_timeout) {
            return Err(anyhow!(
                "Request timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.recovery.request_timeout
            ));
        }

        self.timeouts
            .validate()
            .context("invalid transfer timeouts")
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            read_timeout_secs = self.timeouts.read_timeout,
            write_timeout_secs = self.timeouts.write_timeout,
            "Middleware configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MiddlewareConfig::default().validate().is_ok());
    }

    #[test]
    fn reject_invalid_request_timeout() {
        let config = MiddlewareConfig {
            recovery: RecoveryConfig { request_timeout: 0 },
            ..MiddlewareConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_invalid_transfer_timeouts() {
        let config = MiddlewareConfig {
            timeouts: TransferTimeoutConfig {
                read_timeout: 5,
                write_timeout: 301,
            },
            ..MiddlewareConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
