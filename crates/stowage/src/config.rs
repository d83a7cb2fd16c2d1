//! Storage configuration types.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Re-export configs from driver modules
pub use crate::local::LocalConfig;
pub use crate::minio::MinioConfig;
pub use crate::s3::S3Config;
use crate::TRACING_TARGET_CONFIG;
use crate::error::{StorageError, StorageResult};

/// Region used when a disk does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Longest lifetime of a signed URL (7 days).
pub const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Default lifetime of URLs produced by `url` on object storage disks.
pub const DEFAULT_URL_EXPIRY_SECS: u64 = MAX_URL_EXPIRY_SECS;

pub(crate) fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

pub(crate) fn default_url_expiry_secs() -> u64 {
    DEFAULT_URL_EXPIRY_SECS
}

/// Closed set of storage drivers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::VariantNames
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DriverKind {
    /// Local filesystem.
    Local,
    /// Amazon S3 or any S3-compatible service.
    S3,
    /// MinIO server.
    Minio,
}

impl DriverKind {
    /// Parses a driver name, failing for anything outside of the supported set.
    pub fn parse(name: &str) -> StorageResult<Self> {
        Self::from_str(name).map_err(|_| StorageError::unsupported_driver(name))
    }
}

/// Configuration of one named disk, tagged by its `driver` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum DiskConfig {
    /// Local filesystem disk.
    Local(LocalConfig),
    /// Amazon S3 disk.
    S3(S3Config),
    /// MinIO disk.
    Minio(MinioConfig),
}

impl DiskConfig {
    /// Returns the driver kind of this disk.
    pub fn kind(&self) -> DriverKind {
        match self {
            Self::Local(_) => DriverKind::Local,
            Self::S3(_) => DriverKind::S3,
            Self::Minio(_) => DriverKind::Minio,
        }
    }

    /// Returns the normalized key prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        let prefix = match self {
            Self::Local(config) => config.prefix.as_deref(),
            Self::S3(config) => config.prefix.as_deref(),
            Self::Minio(config) => config.prefix.as_deref(),
        };
        normalize_prefix(prefix)
    }

    /// Returns whether backend call logging is enabled for this disk.
    pub fn debug(&self) -> bool {
        match self {
            Self::Local(config) => config.debug,
            Self::S3(config) => config.debug,
            Self::Minio(config) => config.debug,
        }
    }

    /// Parses a disk configuration, checking the `driver` tag first.
    ///
    /// Unknown driver names are reported as
    /// [`StorageError::UnsupportedDriver`] rather than as a parse error.
    pub fn from_value(value: serde_json::Value) -> StorageResult<Self> {
        let driver = value
            .get("driver")
            .ok_or_else(|| StorageError::config("`driver` is required"))?;
        let name = driver
            .as_str()
            .ok_or_else(|| StorageError::config("`driver` must be a string"))?;
        DriverKind::parse(name)?;

        Ok(serde_json::from_value(value)?)
    }

    /// Validates the driver-specific fields.
    pub fn validate(&self) -> StorageResult<()> {
        match self {
            Self::Local(config) => config.validate(),
            Self::S3(config) => config.validate(),
            Self::Minio(config) => config.validate(),
        }
    }
}

impl From<LocalConfig> for DiskConfig {
    fn from(config: LocalConfig) -> Self {
        Self::Local(config)
    }
}

impl From<S3Config> for DiskConfig {
    fn from(config: S3Config) -> Self {
        Self::S3(config)
    }
}

impl From<MinioConfig> for DiskConfig {
    fn from(config: MinioConfig) -> Self {
        Self::Minio(config)
    }
}

/// Named disks plus the name of the default one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Name of the disk used when none is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Disk configurations keyed by disk name.
    #[serde(default)]
    pub disks: BTreeMap<String, DiskConfig>,
}

impl StorageOptions {
    /// Creates empty storage options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disk under the given name, replacing any previous one.
    pub fn with_disk(mut self, name: impl Into<String>, config: impl Into<DiskConfig>) -> Self {
        self.disks.insert(name.into(), config.into());
        self
    }

    /// Sets the default disk name.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    /// Parses storage options from a JSON document.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        #[derive(Deserialize)]
        struct RawOptions {
            #[serde(default)]
            default: Option<String>,
            #[serde(default)]
            disks: BTreeMap<String, serde_json::Value>,
        }

        let raw: RawOptions = serde_json::from_str(json)?;
        let disks: BTreeMap<String, DiskConfig> = raw
            .disks
            .into_iter()
            .map(|(name, value)| {
                DiskConfig::from_value(value)
                    .map(|config| (name.clone(), config))
                    .map_err(|err| match err {
                        StorageError::Config(msg) => {
                            StorageError::config(format!("disk `{name}`: {msg}"))
                        }
                        other => other,
                    })
            })
            .collect::<StorageResult<_>>()?;

        Ok(Self {
            default: raw.default,
            disks,
        })
    }

    /// Reads storage options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %path.display(),
            "Loading storage options"
        );

        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns the configuration of the named disk.
    pub fn disk(&self, name: &str) -> StorageResult<&DiskConfig> {
        self.disks
            .get(name)
            .ok_or_else(|| StorageError::disk_not_found(name))
    }

    /// Returns the name of the default disk.
    ///
    /// Falls back to the only configured disk when no default is set.
    pub fn default_disk_name(&self) -> StorageResult<&str> {
        if let Some(name) = self.default.as_deref() {
            return Ok(name);
        }

        let mut names = self.disks.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.as_str()),
            (None, _) => Err(StorageError::config("no disks are configured")),
            _ => Err(StorageError::config(
                "no default disk is set and more than one disk is configured",
            )),
        }
    }

    /// Validates every disk and the default disk reference.
    pub fn validate(&self) -> StorageResult<()> {
        if let Some(name) = self.default.as_deref()
            && !self.disks.contains_key(name)
        {
            return Err(StorageError::config(format!(
                "default disk `{name}` is not configured"
            )));
        }

        for (name, disk) in &self.disks {
            disk.validate().map_err(|err| match err {
                StorageError::Config(msg) => StorageError::config(format!("disk `{name}`: {msg}")),
                other => other,
            })?;
        }

        Ok(())
    }
}

/// Trims slashes off a prefix, treating an empty prefix as none.
pub(crate) fn normalize_prefix(prefix: Option<&str>) -> Option<&str> {
    prefix
        .map(|prefix| prefix.trim_matches('/'))
        .filter(|prefix| !prefix.is_empty())
}

/// Checks that a URL-like option parses and uses an HTTP scheme.
pub(crate) fn validate_http_url(field: &str, value: &str) -> StorageResult<url::Url> {
    let url = url::Url::parse(value)
        .map_err(|e| StorageError::config(format!("`{field}` is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(StorageError::config(format!(
            "`{field}` must use http or https, got `{scheme}`"
        ))),
    }
}
