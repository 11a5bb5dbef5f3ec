//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use streamer_server::handler::routes;
//! use streamer_server::service::{ServiceConfig, ServiceState};
//!
//! # fn example() -> anyhow::Result<()> {
//! let state = ServiceState::from_config(&ServiceConfig::memory())?;
//! let router = routes(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod error;
mod files;
mod health;
mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, Health};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with every HTTP route of the streamer.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .merge(files::routes())
        .merge(health::routes())
        .fallback(handler)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum_test::TestServer;
    use streamer_storage::{
        ByteRange, ObjectMetadata, ObjectStream, OpendalGateway, SharedGateway, StorageConfig,
        StorageError, StorageGateway, StorageResult,
    };

    use crate::handler::routes;
    use crate::service::{CompressionPolicy, ServiceState};

    /// In-memory gateway that counts the calls it receives.
    pub struct CountingGateway {
        inner: OpendalGateway,
        calls: AtomicUsize,
        reads: AtomicUsize,
    }

    impl CountingGateway {
        /// Returns a gateway holding the given objects.
        pub async fn seeded<'a>(
            objects: impl IntoIterator<Item = (&'a str, Vec<u8>)>,
        ) -> anyhow::Result<Arc<Self>> {
            let inner = OpendalGateway::new(StorageConfig::Memory)?;
            for (name, data) in objects {
                inner.operator().write(name, data).await?;
            }

            Ok(Arc::new(Self {
                inner,
                calls: AtomicUsize::new(0),
                reads: AtomicUsize::new(0),
            }))
        }

        /// Number of gateway calls of any kind.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of ranged reads opened.
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StorageGateway for CountingGateway {
        async fn exists(&self, name: &str) -> StorageResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.exists(name).await
        }

        async fn metadata(&self, name: &str) -> StorageResult<ObjectMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.metadata(name).await
        }

        async fn read_range(&self, name: &str, range: ByteRange) -> StorageResult<ObjectStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_range(name, range).await
        }
    }

    /// Gateway over a backend that fails with errors other than absence.
    pub struct FailingGateway {
        size: Option<u64>,
    }

    impl FailingGateway {
        /// Every call fails, metadata lookups included.
        pub fn unreachable() -> Arc<Self> {
            Arc::new(Self { size: None })
        }

        /// Every object reports `size` bytes, but reading it fails.
        pub fn unreadable(size: u64) -> Arc<Self> {
            Arc::new(Self { size: Some(size) })
        }

        fn unavailable() -> StorageError {
            StorageError::read("backend unavailable")
        }
    }

    #[async_trait]
    impl StorageGateway for FailingGateway {
        async fn exists(&self, _name: &str) -> StorageResult<bool> {
            self.size.map(|_| true).ok_or_else(Self::unavailable)
        }

        async fn metadata(&self, _name: &str) -> StorageResult<ObjectMetadata> {
            self.size.map(ObjectMetadata::new).ok_or_else(Self::unavailable)
        }

        async fn read_range(&self, _name: &str, _range: ByteRange) -> StorageResult<ObjectStream> {
            Err(StorageError::read("connection reset"))
        }
    }

    /// Returns a new [`TestServer`] over the given gateway.
    pub fn create_test_server_with_gateway(gateway: SharedGateway) -> anyhow::Result<TestServer> {
        let state = ServiceState::new(gateway, CompressionPolicy::default());
        let server = TestServer::new(routes(state))?;
        Ok(server)
    }

    /// Returns a new [`TestServer`] over an empty in-memory store.
    pub fn create_test_server() -> anyhow::Result<TestServer> {
        let gateway = OpendalGateway::new(StorageConfig::Memory)?;
        create_test_server_with_gateway(Arc::new(gateway))
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let response = server.get("/nope").await;
        assert_eq!(response.status_code(), axum::http::StatusCode::NOT_FOUND);
        Ok(())
    }
}
