//! Amazon S3 driver.

mod config;
#[cfg(feature = "s3")]
mod driver;

pub use config::{S3ClientOptions, S3Config};
#[cfg(feature = "s3")]
pub use driver::S3Driver;
