//! MinIO driver.

mod config;
#[cfg(feature = "minio")]
mod driver;

pub use config::{MinioClientOptions, MinioConfig};
#[cfg(feature = "minio")]
pub use driver::MinioDriver;
