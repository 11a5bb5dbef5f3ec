#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod config;
mod error;
mod gateway;
mod types;

#[doc(hidden)]
pub mod prelude;

pub use backend::OpendalGateway;
pub use config::{FsConfig, S3Config, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use gateway::{SharedGateway, StorageGateway};
pub use types::{ByteRange, ObjectMetadata, ObjectStream};

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "streamer_storage";
