//! Errors raised while building the service from its configuration.
//!
//! Request-time failures never surface here. Handlers report them through
//! [`handler::Error`] and the transfer service through [`rpc::ConnectError`].
//!
//! [`handler::Error`]: crate::handler::Error
//! [`rpc::ConnectError`]: crate::rpc::ConnectError

use std::borrow::Cow;

use streamer_storage::StorageError;

/// Result of assembling the service.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Startup failure of the file streamer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is missing or inconsistent.
    #[error("invalid service configuration: {0}")]
    Config(Cow<'static, str>),

    /// The storage backend could not be set up.
    #[error("storage backend unavailable")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(reason.into())
    }
}
