use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use derive_more::Deref;

use crate::extract::Path;
use crate::handler::{Error, ErrorKind};

/// Tracing target for file name validation.
const TRACING_TARGET: &str = "streamer_server::extract::file_name";

/// Name of a stored object, validated once at the request boundary.
///
/// A valid name is non-empty and never contains `..`, so it cannot be used
/// to step outside the configured bucket or directory.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref)]
pub struct FileName(String);

impl FileName {
    /// Validates a raw object name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, Error<'static>> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(ErrorKind::BadRequest
                .with_message("Invalid file name")
                .with_context("File name cannot be empty")
                .with_resource("file"));
        }

        if raw.contains("..") {
            tracing::warn!(
                target: TRACING_TARGET,
                file_name = %raw,
                "Rejected file name with parent directory reference"
            );

            return Err(ErrorKind::BadRequest
                .with_message("Invalid file name")
                .with_context("File name cannot contain '..'")
                .with_resource("file"));
        }

        Ok(Self(raw))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for FileName
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
        Self::parse(raw)
    }
}
