//! Local filesystem driver.

mod config;
#[cfg(feature = "local")]
mod driver;

pub use config::LocalConfig;
#[cfg(feature = "local")]
pub use driver::LocalDriver;
