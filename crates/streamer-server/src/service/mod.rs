//! Application state and dependency injection.

pub mod compression;
mod config;
pub mod context;
pub mod range;
mod state;

pub use crate::service::compression::{CompressionPolicy, accepts_gzip};
pub use crate::service::config::{ServiceConfig, StorageBackend};
pub use crate::service::context::{Interrupted, RequestContext};
pub use crate::service::range::{ResolvedRange, resolve};
pub use crate::service::state::{RequestTimeout, ServiceState};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};
