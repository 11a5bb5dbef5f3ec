//! Gateway failures, split into "the object is absent" and everything else.

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a [`StorageGateway`] call.
///
/// Callers only need to distinguish [`StorageError::NotFound`] from the rest:
/// absence maps to a not-found response, everything else is an internal failure.
///
/// [`StorageGateway`]: crate::StorageGateway
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be built from its configuration.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// No object under the requested name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store refused access to the bucket or object.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Opening or pulling a ranged read failed.
    #[error("read failed: {0}")]
    Read(String),

    /// The requested byte range does not fit the object.
    #[error("invalid range {start}-{end} for object of {size} bytes")]
    InvalidRange {
        /// First requested byte.
        start: u64,
        /// Last requested byte (inclusive).
        end: u64,
        /// Total object size.
        size: u64,
    },

    /// Any other OpenDAL failure, kept whole for its context.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StorageError {
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init(reason.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn read(reason: impl Into<String>) -> Self {
        Self::Read(reason.into())
    }

    /// Returns `true` if the error indicates that the object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(err.to_string()),
            opendal::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
