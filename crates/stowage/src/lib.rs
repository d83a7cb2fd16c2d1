#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod driver;
mod error;
mod lookup;
mod manager;
#[cfg_attr(not(any(feature = "s3", feature = "minio")), allow(dead_code))]
mod object;
mod types;

pub mod local;
pub mod minio;
pub mod s3;

#[doc(hidden)]
pub mod prelude;

pub use config::{
    DEFAULT_REGION, DEFAULT_URL_EXPIRY_SECS, DiskConfig, DriverKind, MAX_URL_EXPIRY_SECS,
    StorageOptions,
};
pub use driver::{Disk, StorageDriver};
pub use error::{StorageError, StorageResult};
pub use local::LocalConfig;
pub use lookup::Lookup;
pub use manager::{DriverManager, Storage};
pub use minio::{MinioClientOptions, MinioConfig};
pub use s3::{S3ClientOptions, S3Config};
pub use types::{
    FileMetadata, FileOptions, PutFileResponse, RenameFileResponse, mime_from_extension,
};

/// Tracing target for driver operations.
pub const TRACING_TARGET_DRIVER: &str = "stowage::driver";

/// Tracing target for driver construction and the disk registry.
pub const TRACING_TARGET_MANAGER: &str = "stowage::manager";

/// Tracing target for configuration loading.
pub const TRACING_TARGET_CONFIG: &str = "stowage::config";
