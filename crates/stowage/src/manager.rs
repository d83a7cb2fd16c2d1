//! Driver construction and the registry of configured disks.

use std::collections::BTreeMap;

use crate::TRACING_TARGET_MANAGER;
use crate::config::{DiskConfig, StorageOptions};
use crate::driver::Disk;
use crate::error::{StorageError, StorageResult};

/// Builds drivers from disk configurations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverManager;

impl DriverManager {
    /// Builds the driver for a disk.
    ///
    /// Fails for invalid configurations and for drivers not compiled in.
    #[allow(unreachable_patterns)]
    pub fn get_driver(disk: &str, config: &DiskConfig) -> StorageResult<Disk> {
        tracing::debug!(
            target: TRACING_TARGET_MANAGER,
            disk = %disk,
            driver = %config.kind(),
            "Building driver"
        );

        config.validate()?;

        match config {
            #[cfg(feature = "local")]
            DiskConfig::Local(config) => {
                crate::local::LocalDriver::new(disk, config.clone()).map(Disk::new)
            }

            #[cfg(feature = "s3")]
            DiskConfig::S3(config) => crate::s3::S3Driver::new(disk, config.clone()).map(Disk::new),

            #[cfg(feature = "minio")]
            DiskConfig::Minio(config) => {
                crate::minio::MinioDriver::new(disk, config.clone()).map(Disk::new)
            }

            _ => Err(StorageError::driver_disabled(config.kind())),
        }
    }

    /// Parses a disk configuration and builds its driver.
    pub fn get_driver_from_value(disk: &str, config: serde_json::Value) -> StorageResult<Disk> {
        Self::get_driver(disk, &DiskConfig::from_value(config)?)
    }
}

/// Every configured disk, built once at startup.
#[derive(Debug, Clone)]
pub struct Storage {
    default: String,
    disks: BTreeMap<String, Disk>,
}

impl Storage {
    /// Builds a driver for every disk.
    ///
    /// Fails on the first disk that cannot be built, so configuration
    /// mistakes surface at startup.
    pub fn new(options: &StorageOptions) -> StorageResult<Self> {
        options.validate()?;
        let default = options.default_disk_name()?.to_owned();

        let disks = options
            .disks
            .iter()
            .map(|(name, config)| {
                DriverManager::get_driver(name, config).map(|disk| (name.clone(), disk))
            })
            .collect::<StorageResult<BTreeMap<_, _>>>()?;

        tracing::info!(
            target: TRACING_TARGET_MANAGER,
            disks = disks.len(),
            default = %default,
            "Storage initialized"
        );

        Ok(Self { default, disks })
    }

    /// Returns the named disk.
    pub fn disk(&self, name: &str) -> StorageResult<&Disk> {
        self.disks
            .get(name)
            .ok_or_else(|| StorageError::disk_not_found(name))
    }

    /// Returns the named disk, or the default one when no name is given.
    pub fn disk_or_default(&self, name: Option<&str>) -> StorageResult<&Disk> {
        match name {
            Some(name) => self.disk(name),
            None => Ok(self.default_disk()),
        }
    }

    /// Returns the default disk.
    pub fn default_disk(&self) -> &Disk {
        // The default name is checked against the disks in `new`.
        &self.disks[&self.default]
    }

    /// Returns the name of the default disk.
    pub fn default_disk_name(&self) -> &str {
        &self.default
    }

    /// Returns the names of every disk.
    pub fn disk_names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }
}
