//! Local filesystem configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::normalize_prefix;
use crate::error::{StorageError, StorageResult};

/// Local filesystem disk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    /// Directory holding the disk's files.
    pub base_path: PathBuf,
    /// Public URL the disk root is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sub-directory within the base path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Logs every backend call.
    #[serde(default)]
    pub debug: bool,
}

impl LocalConfig {
    /// Creates a new local configuration rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: None,
            prefix: None,
            debug: false,
        }
    }

    /// Sets the public URL root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the sub-directory prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Enables backend call logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns the absolute directory the disk operates in.
    pub fn root(&self) -> StorageResult<PathBuf> {
        let base = std::path::absolute(&self.base_path)?;
        Ok(match normalize_prefix(self.prefix.as_deref()) {
            Some(prefix) => base.join(prefix),
            None => base,
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.base_path.as_os_str().is_empty() {
            return Err(StorageError::config(
                "`basePath` is required for the local driver",
            ));
        }

        if let Some(prefix) = normalize_prefix(self.prefix.as_deref())
            && prefix.split('/').any(|segment| segment == "..")
        {
            return Err(StorageError::config(
                "`prefix` cannot leave the base path",
            ));
        }

        if self
            .base_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(StorageError::config("`baseUrl` cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_prefix_onto_base_path() {
        let config = LocalConfig::new("/tmp/store").with_prefix("/uploads/");
        assert_eq!(config.root().unwrap(), PathBuf::from("/tmp/store/uploads"));
        assert_eq!(
            LocalConfig::new("/tmp/store").root().unwrap(),
            PathBuf::from("/tmp/store")
        );
    }

    #[test]
    fn resolves_relative_base_path() {
        let root = LocalConfig::new("store").root().unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("store"));
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(LocalConfig::new("").validate().is_err());
        assert!(
            LocalConfig::new("/tmp/store")
                .with_prefix("../etc")
                .validate()
                .is_err()
        );
        assert!(
            LocalConfig::new("/tmp/store")
                .with_base_url(" ")
                .validate()
                .is_err()
        );
        assert!(LocalConfig::new("/tmp/store").validate().is_ok());
    }

    #[test]
    fn reads_camel_case_fields() {
        let config: LocalConfig = serde_json::from_str(
            r#"{ "basePath": "/tmp/store", "baseUrl": "https://cdn.example.com/files" }"#,
        )
        .unwrap();
        assert_eq!(config.base_path, PathBuf::from("/tmp/store"));
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://cdn.example.com/files")
        );
        assert!(!config.debug);
    }
}
