use std::sync::Arc;
use std::time::Duration;

use streamer_storage::{OpendalGateway, SharedGateway};

use crate::TRACING_TARGET_SERVICE;
use crate::service::{CompressionPolicy, Result, ServiceConfig};

/// Handler deadline applied to every request when nothing else is configured.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the lifetime of a single request.
///
/// Every [`RequestContext`] is derived from this value.
///
/// [`RequestContext`]: crate::service::RequestContext
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeout(pub Duration);

impl Default for RequestTimeout {
    fn default() -> Self {
        Self(DEFAULT_REQUEST_TIMEOUT)
    }
}

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    gateway: SharedGateway,
    compression_policy: CompressionPolicy,
    request_timeout: RequestTimeout,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Builds the storage backend selected by the configuration. No network
    /// round-trip is made; an unreachable store surfaces on the first request.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let gateway = OpendalGateway::new(config.storage_config())?;

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            backend = gateway.backend_name(),
            min_compression_size = config.min_compression_size,
            "Service state initialized"
        );

        Ok(Self::new(Arc::new(gateway), config.compression_policy()))
    }

    /// Creates state around an existing gateway.
    pub fn new(gateway: SharedGateway, compression_policy: CompressionPolicy) -> Self {
        Self {
            gateway,
            compression_policy,
            request_timeout: RequestTimeout::default(),
        }
    }

    /// Sets the per-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = RequestTimeout(timeout);
        self
    }

    /// Returns the shared storage gateway.
    #[inline]
    pub fn gateway(&self) -> &SharedGateway {
        &self.gateway
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(gateway: SharedGateway);
impl_di!(compression_policy: CompressionPolicy);
impl_di!(request_timeout: RequestTimeout);

#[cfg(test)]
mod tests {
    use axum::extract::FromRef;

    use super::*;

    #[test]
    fn memory_state_from_config() {
        let state = ServiceState::from_config(&ServiceConfig::memory()).unwrap();
        assert_eq!(
            CompressionPolicy::from_ref(&state),
            CompressionPolicy::default()
        );
        assert_eq!(RequestTimeout::from_ref(&state), RequestTimeout::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ServiceConfig {
            bucket: String::new(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            ServiceState::from_config(&config),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn request_timeout_override() {
        let state = ServiceState::from_config(&ServiceConfig::memory())
            .unwrap()
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(
            RequestTimeout::from_ref(&state),
            RequestTimeout(Duration::from_secs(5))
        );
    }
}
