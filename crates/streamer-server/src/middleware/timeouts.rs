//! Connection-level read and write limits.

use std::time::Duration;

use axum::Router;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer};

use crate::{Error, Result};

/// Limits on how long a request or response body may stall.
///
/// Both limits are measured between consecutive body frames, so a slow but
/// steady transfer is never cut off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct TransferTimeoutConfig {
    /// Seconds to wait for the next frame of a request body.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "READ_TIMEOUT", default_value = "5")
    )]
    pub read_timeout: u64,

    /// Seconds to wait for the next frame of a response body.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "WRITE_TIMEOUT", default_value = "10")
    )]
    pub write_timeout: u64,
}

impl Default for TransferTimeoutConfig {
    fn default() -> Self {
        Self {
            read_timeout: 5,
            write_timeout: 10,
        }
    }
}

impl TransferTimeoutConfig {
    /// Returns the request body timeout as a Duration.
    #[inline]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    /// Returns the response body timeout as a Duration.
    #[inline]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    /// Validates that both limits lie within 1..=300 seconds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("read timeout", self.read_timeout),
            ("write timeout", self.write_timeout),
        ] {
            if !(1..=300).contains(&value) {
                return Err(Error::config(format!(
                    "{name} must be between 1 and 300 seconds, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Extension trait for `axum::`[`Router`] to apply body timeouts.
pub trait RouterTimeoutExt<S> {
    /// Layers request and response body timeouts.
    fn with_transfer_timeouts(self, config: &TransferTimeoutConfig) -> Self;
}

impl<S> RouterTimeoutExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_transfer_timeouts(self, config: &TransferTimeoutConfig) -> Self {
        self.layer(RequestBodyTimeoutLayer::new(config.read_timeout()))
            .layer(ResponseBodyTimeoutLayer::new(config.write_timeout()))
    }
}
