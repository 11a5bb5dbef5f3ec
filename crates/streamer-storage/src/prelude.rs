//! Prelude module for convenient imports.

pub use crate::backend::OpendalGateway;
pub use crate::config::{FsConfig, S3Config, StorageConfig};
pub use crate::error::{StorageError, StorageResult};
pub use crate::gateway::{SharedGateway, StorageGateway};
pub use crate::types::{ByteRange, ObjectMetadata, ObjectStream};
