//! MinIO configuration.

use serde::{Deserialize, Serialize};

use crate::config::{
    MAX_URL_EXPIRY_SECS, default_region, default_url_expiry_secs, validate_http_url,
};
use crate::error::{StorageError, StorageResult};

fn default_use_ssl() -> bool {
    true
}

/// MinIO disk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinioConfig {
    /// Bucket name.
    pub bucket: String,
    /// Key prefix within the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Lifetime in seconds of URLs returned by `url`.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
    /// Connection options for the MinIO server.
    pub minio_options: MinioClientOptions,
    /// Logs every backend call.
    #[serde(default)]
    pub debug: bool,
}

/// Connection options for a MinIO server.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinioClientOptions {
    /// Host name of the server, without scheme.
    pub end_point: String,
    /// Port; the scheme default is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Connects over HTTPS.
    #[serde(rename = "useSSL", alias = "useSsl", default = "default_use_ssl")]
    pub use_ssl: bool,
    /// Access key.
    pub access_key: String,
    /// Secret key.
    pub secret_key: String,
    /// Session token for temporary credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Region the server reports.
    #[serde(default = "default_region")]
    pub region: String,
}

impl MinioClientOptions {
    /// Creates connection options for an HTTPS server.
    pub fn new(
        end_point: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            end_point: end_point.into(),
            port: None,
            use_ssl: default_use_ssl(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
            region: default_region(),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets whether HTTPS is used.
    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Returns the endpoint URL built from host, port and scheme.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}", self.end_point),
            None => format!("{scheme}://{}", self.end_point),
        }
    }

    /// Returns a masked version of the access key for logging.
    pub fn access_key_masked(&self) -> String {
        if self.access_key.chars().count() > 4 {
            format!("{}***", self.access_key.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        }
    }

    fn validate(&self) -> StorageResult<()> {
        if self.end_point.trim().is_empty() {
            return Err(StorageError::config("`minioOptions.endPoint` is required"));
        }

        if self.end_point.contains("://") {
            return Err(StorageError::config(
                "`minioOptions.endPoint` must be a host name, use `useSSL` to pick the scheme",
            ));
        }

        validate_http_url("minioOptions.endPoint", &self.endpoint_url())?;

        if self.access_key.is_empty() {
            return Err(StorageError::config("access key cannot be empty"));
        }

        if self.secret_key.is_empty() {
            return Err(StorageError::config("secret key cannot be empty"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for MinioClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinioClientOptions")
            .field("end_point", &self.end_point)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key_masked())
            .field("region", &self.region)
            .finish()
    }
}

impl MinioConfig {
    /// Creates a new MinIO configuration.
    pub fn new(bucket: impl Into<String>, minio_options: MinioClientOptions) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            url_expiry_secs: default_url_expiry_secs(),
            minio_options,
            debug: false,
        }
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the lifetime of URLs returned by `url`.
    pub fn with_url_expiry_secs(mut self, secs: u64) -> Self {
        self.url_expiry_secs = secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(StorageError::config(
                "`bucket` is required for the minio driver",
            ));
        }

        if self.url_expiry_secs == 0 || self.url_expiry_secs > MAX_URL_EXPIRY_SECS {
            return Err(StorageError::config(format!(
                "`urlExpirySecs` must be between 1 and {MAX_URL_EXPIRY_SECS}"
            )));
        }

        self.minio_options.validate()
    }
}
