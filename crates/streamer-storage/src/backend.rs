//! OpenDAL-backed storage gateway.

use async_trait::async_trait;
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::gateway::StorageGateway;
use crate::types::{ByteRange, ObjectMetadata, ObjectStream};

/// Storage gateway that wraps an OpenDAL operator.
#[derive(Clone)]
pub struct OpendalGateway {
    operator: Operator,
    backend: &'static str,
}

impl OpendalGateway {
    /// Creates a new gateway from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            "Storage backend initialized"
        );

        Ok(Self {
            operator,
            backend: config.backend_name(),
        })
    }

    /// Wraps an already-built operator.
    pub fn from_operator(operator: Operator) -> Self {
        Self {
            operator,
            backend: "custom",
        }
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    /// Returns the underlying operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Creates an OpenDAL operator based on configuration.
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config {
            #[cfg(feature = "s3")]
            StorageConfig::S3(s3) => {
                let mut builder = services::S3::default()
                    .bucket(&s3.bucket)
                    .region(&s3.region)
                    .endpoint(&s3.endpoint_url());

                if let Some(ref access_key_id) = s3.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = s3.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(feature = "fs")]
            StorageConfig::Fs(fs) => {
                let root = fs.root.to_string_lossy();
                let builder = services::Fs::default().root(&root);

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| StorageError::init(e.to_string()))
            }

            StorageConfig::Memory => Operator::new(services::Memory::default())
                .map(|op| op.finish())
                .map_err(|e| StorageError::init(e.to_string())),

            #[allow(unreachable_patterns)]
            _ => Err(StorageError::init(format!(
                "Backend type {} is not supported with current features",
                config.backend_name()
            ))),
        }
    }
}

#[async_trait]
impl StorageGateway for OpendalGateway {
    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(name).await?)
    }

    async fn metadata(&self, name: &str) -> StorageResult<ObjectMetadata> {
        let meta = self.operator.stat(name).await?;

        if meta.is_dir() {
            return Err(StorageError::not_found(name));
        }

        Ok(ObjectMetadata {
            size: meta.content_length(),
            content_type: meta.content_type().map(ToOwned::to_owned),
        })
    }

    async fn read_range(&self, name: &str, range: ByteRange) -> StorageResult<ObjectStream> {
        tracing::debug!(
            target: TRACING_TARGET,
            name = %name,
            range = %range,
            "Opening ranged read"
        );

        let stream = self
            .operator
            .reader(name)
            .await?
            .into_bytes_stream(range.start()..=range.end())
            .await?;

        Ok(ObjectStream::new(name, range, stream))
    }
}
