//! MinIO driver, speaking the S3 protocol through OpenDAL.

use std::time::Duration;

use async_trait::async_trait;
use opendal::{Operator, services};

use super::MinioConfig;
use crate::TRACING_TARGET_DRIVER;
use crate::config::{DiskConfig, normalize_prefix};
use crate::driver::{StorageDriver, validate_path, validate_paths};
use crate::error::StorageResult;
use crate::object::{finish_operator, guarded_copy, presign};
use crate::types::RenameFileResponse;

/// Driver for a MinIO server.
///
/// MinIO buckets are private, so `url` always returns a signed URL valid
/// for the configured `urlExpirySecs`.
#[derive(Clone)]
pub struct MinioDriver {
    disk: String,
    config: DiskConfig,
    url_expiry: Duration,
    operator: Operator,
}

impl MinioDriver {
    /// Creates a new driver for the named disk.
    pub fn new(disk: impl Into<String>, config: MinioConfig) -> StorageResult<Self> {
        let disk = disk.into();
        config.validate()?;

        let options = &config.minio_options;
        let endpoint = options.endpoint_url();
        let prefix = normalize_prefix(config.prefix.as_deref());

        let mut builder = services::S3::default()
            .bucket(&config.bucket)
            .region(&options.region)
            .endpoint(&endpoint)
            .access_key_id(&options.access_key)
            .secret_access_key(&options.secret_key)
            .root(&format!("/{}", prefix.unwrap_or_default()))
            .disable_config_load()
            .disable_ec2_metadata();

        if let Some(session_token) = options.session_token.as_deref() {
            builder = builder.session_token(session_token);
        }

        let operator = finish_operator(builder, config.debug)?;

        tracing::info!(
            target: TRACING_TARGET_DRIVER,
            disk = %disk,
            endpoint = %endpoint,
            bucket = %config.bucket,
            prefix = ?prefix,
            access_key = %options.access_key_masked(),
            "MinIO driver initialized"
        );

        Ok(Self {
            disk,
            url_expiry: Duration::from_secs(config.url_expiry_secs),
            config: DiskConfig::Minio(config),
            operator,
        })
    }
}

#[async_trait]
impl StorageDriver for MinioDriver {
    fn disk(&self) -> &str {
        &self.disk
    }

    fn config(&self) -> &DiskConfig {
        &self.config
    }

    fn client(&self) -> &Operator {
        &self.operator
    }

    async fn url(&self, path: &str) -> StorageResult<String> {
        self.signed_url(path, self.url_expiry).await
    }

    async fn signed_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
        let key = validate_path(path)?;
        presign(&self.operator, key, expires_in).await
    }

    async fn copy(&self, path: &str, new_path: &str) -> StorageResult<RenameFileResponse> {
        let (from, to) = validate_paths(path, new_path)?;

        tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk,
            from = %from,
            to = %to,
            "Copying object"
        );

        guarded_copy(&self.operator, from, to).await?;
        Ok(RenameFileResponse::copied(to, self.url(to).await?))
    }
}

impl std::fmt::Debug for MinioDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinioDriver")
            .field("disk", &self.disk)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
