//! The storage capability set consumed by the transports.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{ByteRange, ObjectMetadata, ObjectStream};

/// Shared, read-only handle to a [`StorageGateway`].
pub type SharedGateway = Arc<dyn StorageGateway>;

/// Read access to named objects in a blob store.
///
/// Implementations hold no request-scoped state; a single instance is shared
/// by every concurrent request on every transport. Every method reports
/// absence with [`StorageError::NotFound`] so callers can tell it apart from
/// other failures.
///
/// [`StorageError::NotFound`]: crate::StorageError::NotFound
#[async_trait]
pub trait StorageGateway: Send + Sync + 'static {
    /// Returns whether an object with the given name exists.
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Returns the metadata of the named object.
    async fn metadata(&self, name: &str) -> StorageResult<ObjectMetadata>;

    /// Opens a streaming read of exactly the bytes in `range`.
    async fn read_range(&self, name: &str, range: ByteRange) -> StorageResult<ObjectStream>;
}
