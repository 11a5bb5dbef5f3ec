use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use streamer_storage::{FsConfig, S3Config, StorageConfig};

use crate::service::compression::DEFAULT_MIN_COMPRESSION_SIZE;
use crate::service::{CompressionPolicy, Error, Result};

/// Storage backend selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible object store (MinIO).
    #[default]
    S3,
    /// Local directory.
    Fs,
    /// In-memory store, empty on startup.
    Memory,
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Storage backend that holds the served files.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "s3")
    )]
    pub storage_backend: StorageBackend,

    /// Bucket holding the served files.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MINIO_BUCKET", default_value = "files")
    )]
    pub bucket: String,

    /// Host (and port) of the S3-compatible endpoint, without scheme.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MINIO_HOST", default_value = "localhost:9000")
    )]
    pub storage_endpoint: String,

    /// Region reported to the S3-compatible endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MINIO_REGION", default_value = "us-east-1")
    )]
    pub storage_region: String,

    /// Access key ID for the S3-compatible endpoint.
    #[cfg_attr(feature = "config", arg(long, env = "MINIO_ACCESS_KEY_ID"))]
    pub access_key_id: Option<String>,

    /// Secret access key for the S3-compatible endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MINIO_SECRET_ACCESS_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Talk to the S3-compatible endpoint over TLS.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MINIO_USE_SSL", default_value_t = false)
    )]
    pub use_ssl: bool,

    /// Root directory of the `fs` backend.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STORAGE_ROOT", default_value = "./data")
    )]
    pub storage_root: PathBuf,

    /// Bodies smaller than this many bytes are never gzip-encoded.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MIN_COMPRESSION_SIZE", default_value_t = DEFAULT_MIN_COMPRESSION_SIZE)
    )]
    pub min_compression_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            bucket: "files".to_owned(),
            storage_endpoint: "localhost:9000".to_owned(),
            storage_region: "us-east-1".to_owned(),
            access_key_id: None,
            secret_access_key: None,
            use_ssl: false,
            storage_root: "./data".into(),
            min_compression_size: DEFAULT_MIN_COMPRESSION_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Returns a configuration backed by the in-memory store.
    pub fn memory() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> Result<()> {
        match self.storage_backend {
            StorageBackend::S3 if self.bucket.trim().is_empty() => {
                Err(Error::config("Storage bucket cannot be empty"))
            }
            StorageBackend::S3 if self.storage_endpoint.trim().is_empty() => {
                Err(Error::config("Storage endpoint cannot be empty"))
            }
            StorageBackend::S3 if self.access_key_id.is_some() != self.secret_access_key.is_some() => {
                Err(Error::config(
                    "Access key ID and secret access key must be provided together",
                ))
            }
            StorageBackend::Fs if self.storage_root.as_os_str().is_empty() => {
                Err(Error::config("Storage root cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Builds the storage backend configuration.
    pub fn storage_config(&self) -> StorageConfig {
        match self.storage_backend {
            StorageBackend::S3 => {
                let mut config = S3Config::new(&self.bucket, &self.storage_endpoint)
                    .with_region(&self.storage_region)
                    .with_ssl(self.use_ssl);

                if let (Some(access_key_id), Some(secret_access_key)) =
                    (&self.access_key_id, &self.secret_access_key)
                {
                    config = config.with_credentials(access_key_id, secret_access_key);
                }

                StorageConfig::S3(config)
            }
            StorageBackend::Fs => StorageConfig::Fs(FsConfig::new(&self.storage_root)),
            StorageBackend::Memory => StorageConfig::Memory,
        }
    }

    /// Returns the compression policy.
    #[inline]
    pub const fn compression_policy(&self) -> CompressionPolicy {
        CompressionPolicy::new(self.min_compression_size)
    }
}
