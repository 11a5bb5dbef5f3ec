//! Storage error to HTTP error conversion.

use streamer_storage::StorageError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for storage error conversions.
const TRACING_TARGET: &str = "streamer_server::handler::storage";

impl From<StorageError> for HttpError<'static> {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "File not found"
                );

                ErrorKind::NotFound.with_resource("file")
            }
            error => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Storage operation failed"
                );

                ErrorKind::InternalServerError
                    .with_message("Storage operation failed")
                    .with_resource("file")
            }
        }
    }
}
