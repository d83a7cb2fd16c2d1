//! Prelude module for convenient imports.

pub use crate::config::{DiskConfig, DriverKind, StorageOptions};
pub use crate::driver::{Disk, StorageDriver};
pub use crate::error::{StorageError, StorageResult};
pub use crate::local::LocalConfig;
pub use crate::lookup::Lookup;
pub use crate::manager::{DriverManager, Storage};
pub use crate::minio::{MinioClientOptions, MinioConfig};
pub use crate::s3::{S3ClientOptions, S3Config};
pub use crate::types::{FileMetadata, FileOptions, PutFileResponse, RenameFileResponse};
