//! Amazon S3 driver built on the OpenDAL `s3` service.

use std::time::Duration;

use async_trait::async_trait;
use opendal::{Operator, services};

use super::S3Config;
use crate::TRACING_TARGET_DRIVER;
use crate::config::{DiskConfig, normalize_prefix};
use crate::driver::{StorageDriver, validate_path, validate_paths};
use crate::error::StorageResult;
use crate::object::{finish_operator, guarded_copy, presign, public_url};
use crate::types::RenameFileResponse;

/// Driver for Amazon S3 and S3-compatible services.
#[derive(Clone)]
pub struct S3Driver {
    disk: String,
    config: DiskConfig,
    prefix: Option<String>,
    public_url: Option<String>,
    url_expiry: Duration,
    operator: Operator,
}

impl S3Driver {
    /// Creates a new driver for the named disk.
    ///
    /// Static credentials in `s3Options` are used as-is. Without them the
    /// ambient AWS credential chain (environment, shared config, instance
    /// metadata) is consulted when a request is signed.
    pub fn new(disk: impl Into<String>, config: S3Config) -> StorageResult<Self> {
        let disk = disk.into();
        config.validate()?;

        let prefix = normalize_prefix(config.prefix.as_deref()).map(ToOwned::to_owned);
        let options = &config.s3_options;

        let mut builder = services::S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .root(&format!("/{}", prefix.as_deref().unwrap_or_default()));

        if let Some(endpoint) = options.endpoint.as_deref() {
            builder = builder.endpoint(endpoint);
        }

        if let (Some(access_key_id), Some(secret_access_key)) = (
            options.access_key_id.as_deref(),
            options.secret_access_key.as_deref(),
        ) {
            builder = builder
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .disable_config_load()
                .disable_ec2_metadata();
        }

        if let Some(session_token) = options.session_token.as_deref() {
            builder = builder.session_token(session_token);
        }

        if options.virtual_host_style {
            builder = builder.enable_virtual_host_style();
        }

        let operator = finish_operator(builder, config.debug)?;

        tracing::info!(
            target: TRACING_TARGET_DRIVER,
            disk = %disk,
            bucket = %config.bucket,
            region = %config.region,
            profile = ?config.profile,
            prefix = ?prefix,
            endpoint = ?options.endpoint,
            static_credentials = config.has_static_credentials(),
            "S3 driver initialized"
        );

        Ok(Self {
            disk,
            prefix,
            public_url: config.public_url.clone(),
            url_expiry: Duration::from_secs(config.url_expiry_secs),
            config: DiskConfig::S3(config),
            operator,
        })
    }
}

#[async_trait]
impl StorageDriver for S3Driver {
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
        let key = validate_path(path)?;

        match &self.public_url {
            Some(root) => Ok(public_url(root, self.prefix.as_deref(), key)),
            None => presign(&self.operator, key, self.url_expiry).await,
        }
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

impl std::fmt::Debug for S3Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Driver")
            .field("disk", &self.disk)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
