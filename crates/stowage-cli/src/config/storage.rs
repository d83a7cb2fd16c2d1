//! Storage configuration arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use stowage::StorageOptions;

use crate::TRACING_TARGET_CONFIG;

/// Where to find the disk configuration and which disk to use.
///
/// # Environment Variables
///
/// - `STOWAGE_CONFIG` - Path of the JSON disk configuration (default: `stowage.json`)
/// - `STOWAGE_DISK` - Disk to operate on (default: the configured default disk)
///
/// # Examples
///
/// ```bash
/// stowage --config /etc/app/storage.json --disk media url images/cat.png
///
/// STOWAGE_DISK=media stowage url images/cat.png
/// ```
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct StorageConfig {
    /// Path of the JSON disk configuration.
    #[arg(short = 'c', long = "config", env = "STOWAGE_CONFIG", default_value = "stowage.json")]
    pub config_path: PathBuf,

    /// Disk to operate on, the default disk when unset.
    #[arg(short = 'd', long, env = "STOWAGE_DISK")]
    pub disk: Option<String>,
}

impl StorageConfig {
    /// Reads and validates the disk configuration.
    pub fn load(&self) -> anyhow::Result<StorageOptions> {
        let options = StorageOptions::from_path(&self.config_path).with_context(|| {
            format!(
                "failed to load storage configuration from {}",
                self.config_path.display()
            )
        })?;

        options
            .validate()
            .context("invalid storage configuration")?;

        if let Some(disk) = self.disk.as_deref() {
            options
                .disk(disk)
                .with_context(|| format!("disk `{disk}` is not configured"))?;
        }

        Ok(options)
    }

    /// Logs the configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            config_path = %self.config_path.display(),
            disk = ?self.disk,
            "Storage configuration"
        );
    }
}
