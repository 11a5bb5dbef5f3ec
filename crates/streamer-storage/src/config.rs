//! Storage configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StorageConfig {
    /// Amazon S3 compatible storage (MinIO, R2, ...).
    S3(S3Config),
    /// Local directory.
    Fs(FsConfig),
    /// Process-local in-memory store, empty on startup.
    Memory,
}

impl StorageConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::Fs(_) => "fs",
            Self::Memory => "memory",
        }
    }
}

/// S3-compatible storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,
    /// Region; MinIO accepts any value.
    pub region: String,
    /// Host (and optional port) of the storage service, without scheme.
    pub endpoint: String,
    /// Whether to talk to the endpoint over TLS.
    #[serde(default)]
    pub use_ssl: bool,
    /// Access key ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    /// Secret access key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Creates a new S3 configuration.
    pub fn new(bucket: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_owned(),
            endpoint: endpoint.into(),
            use_ssl: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Enables or disables TLS.
    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Returns the endpoint as a URL, adding the scheme if missing.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return self.endpoint.clone();
        }

        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.endpoint)
    }
}

/// Local directory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsConfig {
    /// Directory holding the objects.
    pub root: PathBuf,
}

impl FsConfig {
    /// Creates a new filesystem configuration.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_adds_scheme() {
        let config = S3Config::new("files", "localhost:9000");
        assert_eq!(config.endpoint_url(), "http://localhost:9000");

        let config = config.with_ssl(true);
        assert_eq!(config.endpoint_url(), "https://localhost:9000");
    }

    #[test]
    fn endpoint_url_keeps_explicit_scheme() {
        let config = S3Config::new("files", "https://minio.internal").with_ssl(false);
        assert_eq!(config.endpoint_url(), "https://minio.internal");
    }

    #[test]
    fn backend_names() {
        assert_eq!(StorageConfig::Memory.backend_name(), "memory");
        assert_eq!(StorageConfig::Fs(FsConfig::new("/tmp")).backend_name(), "fs");
        assert_eq!(
            StorageConfig::S3(S3Config::new("files", "localhost:9000")).backend_name(),
            "s3"
        );
    }
}
