//! Local filesystem driver built on the OpenDAL `fs` service.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use opendal::{Operator, services};

use super::LocalConfig;
use crate::TRACING_TARGET_DRIVER;
use crate::config::DiskConfig;
use crate::driver::{StorageDriver, validate_path, validate_paths};
use crate::error::StorageResult;
use crate::object::finish_operator;
use crate::types::RenameFileResponse;

/// Driver storing files in a directory on the local filesystem.
///
/// URLs are the public `baseUrl` joined with the path when one is
/// configured, and the absolute file path otherwise. Signed URLs are the
/// same as plain ones.
#[derive(Clone)]
pub struct LocalDriver {
    disk: String,
    config: DiskConfig,
    root: PathBuf,
    base_url: Option<String>,
    operator: Operator,
}

impl LocalDriver {
    /// Creates a new driver for the named disk.
    pub fn new(disk: impl Into<String>, config: LocalConfig) -> StorageResult<Self> {
        let disk = disk.into();
        config.validate()?;

        let root = config.root()?;
        let builder = services::Fs::default().root(&root.to_string_lossy());
        let operator = finish_operator(builder, config.debug)?;

        tracing::info!(
            target: TRACING_TARGET_DRIVER,
            disk = %disk,
            root = %root.display(),
            base_url = ?config.base_url,
            "Local driver initialized"
        );

        Ok(Self {
            disk,
            base_url: config
                .base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_owned()),
            config: DiskConfig::Local(config),
            root,
            operator,
        })
    }

    /// Returns the directory the disk operates in.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl StorageDriver for LocalDriver {
    fn disk(&self) -> &str {
        &self.disk
    }

    fn config(&self) -> &DiskConfig {
        &self.config
    }

    fn client(&self) -> &Operator {
        &self.operator
    }

    async fn url(&self, path: &str) -> StorageResult<String> {
        let key = validate_path(path)?;

        Ok(match &self.base_url {
            Some(base_url) => format!("{base_url}/{key}"),
            None => self.root.join(key).to_string_lossy().into_owned(),
        })
    }

    async fn signed_url(&self, path: &str, _expires_in: Duration) -> StorageResult<String> {
        self.url(path).await
    }

    async fn move_file(&self, path: &str, new_path: &str) -> StorageResult<RenameFileResponse> {
        let (from, to) = validate_paths(path, new_path)?;

        tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk,
            from = %from,
            to = %to,
            "Renaming file"
        );

        self.operator.rename(from, to).await?;

        let url = self.url(to).await?;
        Ok(RenameFileResponse::copied(to, url).with_source_removed())
    }
}

impl std::fmt::Debug for LocalDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDriver")
            .field("disk", &self.disk)
            .field("root", &self.root)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tempfile::TempDir;

    use super::*;
    use crate::error::StorageError;
    use crate::types::FileOptions;

    fn driver(dir: &TempDir) -> LocalDriver {
        LocalDriver::new("local", LocalConfig::new(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        let response = disk
            .put("a/b.txt", Bytes::from_static(b"hello"), FileOptions::default())
            .await
            .unwrap();
        assert_eq!(response.path, "a/b.txt");
        assert!(dir.path().join("a/b.txt").is_file());

        assert_eq!(disk.get("a/b.txt").await.unwrap(), "hello");
        assert!(disk.exists("a/b.txt").await);
        assert!(!disk.missing("a/b.txt").await);

        assert!(disk.delete("a/b.txt").await);
        assert!(disk.get("a/b.txt").await.is_none());
        assert!(disk.missing("a/b.txt").await);
    }

    #[tokio::test]
    async fn missing_objects_are_sentinels() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        assert!(disk.get("nope.txt").await.is_none());
        assert!(disk.meta("nope.txt").await.is_empty());
        assert!(disk.read("nope.txt").await.is_absent());
        assert!(!disk.exists("nope.txt").await);
    }

    #[tokio::test]
    async fn meta_describes_the_file() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        disk.put("doc.json", Bytes::from_static(b"{}"), FileOptions::default())
            .await
            .unwrap();

        let meta = disk.meta("doc.json").await;
        assert_eq!(meta.path.as_deref(), Some("doc.json"));
        assert_eq!(meta.content_type.as_deref(), Some("application/json"));
        assert_eq!(meta.content_length, Some(2));
        assert!(meta.last_modified.is_some());
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        disk.put("a/b.txt", Bytes::from_static(b"x"), FileOptions::default())
            .await
            .unwrap();
        assert!(disk.meta("a").await.is_empty());
    }

    #[tokio::test]
    async fn copy_keeps_source() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        disk.put("a.txt", Bytes::from_static(b"data"), FileOptions::default())
            .await
            .unwrap();

        let response = disk.copy("a.txt", "copies/b.txt").await.unwrap();
        assert_eq!(response.path, "copies/b.txt");
        assert!(response.source_retained);
        assert!(disk.exists("a.txt").await);
        assert_eq!(disk.get("copies/b.txt").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn move_removes_source() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        disk.put("a.txt", Bytes::from_static(b"data"), FileOptions::default())
            .await
            .unwrap();

        let response = disk.move_file("a.txt", "moved/b.txt").await.unwrap();
        assert_eq!(response.path, "moved/b.txt");
        assert!(!response.source_retained);
        assert!(disk.missing("a.txt").await);
        assert_eq!(disk.get("moved/b.txt").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn copy_of_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        let err = disk.copy("nope.txt", "b.txt").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(disk.missing("b.txt").await);
    }

    /// Local driver whose deletes always fail, to exercise the copy + delete move.
    #[derive(Debug)]
    struct UndeletableDriver(LocalDriver);

    #[async_trait]
    impl StorageDriver for UndeletableDriver {
        fn disk(&self) -> &str {
            self.0.disk()
        }

        fn config(&self) -> &DiskConfig {
            self.0.config()
        }

        fn client(&self) -> &Operator {
            self.0.client()
        }

        async fn url(&self, path: &str) -> StorageResult<String> {
            self.0.url(path).await
        }

        async fn signed_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
            self.0.signed_url(path, expires_in).await
        }

        async fn remove(&self, path: &str) -> StorageResult<()> {
            Err(StorageError::PermissionDenied(path.to_owned()))
        }
    }

    #[tokio::test]
    async fn failed_delete_leaves_both_objects() {
        let dir = TempDir::new().unwrap();
        let disk = UndeletableDriver(driver(&dir));

        disk.put("a.txt", Bytes::from_static(b"data"), FileOptions::default())
            .await
            .unwrap();

        let response = disk.move_file("a.txt", "b.txt").await.unwrap();
        assert!(response.source_retained);
        assert!(disk.exists("a.txt").await);
        assert!(disk.exists("b.txt").await);
        assert!(!disk.delete("a.txt").await);
    }

    /// Local driver copying by read then write, as drivers without a native
    /// copy do.
    #[derive(Debug)]
    struct RewritingDriver(LocalDriver);

    #[async_trait]
    impl StorageDriver for RewritingDriver {
        fn disk(&self) -> &str {
            self.0.disk()
        }

        fn config(&self) -> &DiskConfig {
            self.0.config()
        }

        fn client(&self) -> &Operator {
            self.0.client()
        }

        async fn url(&self, path: &str) -> StorageResult<String> {
            self.0.url(path).await
        }

        async fn signed_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
            self.0.signed_url(path, expires_in).await
        }

        async fn copy(&self, path: &str, new_path: &str) -> StorageResult<RenameFileResponse> {
            let content = self
                .read(path)
                .await
                .into_result()?
                .ok_or_else(|| StorageError::not_found(path))?;
            self.put(new_path, content, FileOptions::default()).await?;
            Ok(RenameFileResponse::copied(new_path, self.url(new_path).await?))
        }
    }

    #[tokio::test]
    async fn move_onto_itself_keeps_the_object() {
        let dir = TempDir::new().unwrap();
        let disk = RewritingDriver(driver(&dir));

        disk.put("a.txt", Bytes::from_static(b"data"), FileOptions::default())
            .await
            .unwrap();

        for target in ["a.txt", "/a.txt"] {
            let err = disk.move_file("a.txt", target).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath(_)), "{err}");
        }
        assert_eq!(disk.get("a.txt").await.unwrap(), "data");

        let local = driver(&dir);
        assert!(local.move_file("/a.txt", "a.txt").await.is_err());
        assert!(local.copy("a.txt", "/a.txt").await.is_err());
        assert_eq!(local.get("a.txt").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn put_accepts_explicit_mime_type() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        let options = FileOptions::new().with_mime_type("text/markdown");
        let response = disk
            .put("/notes/readme", Bytes::from_static(b"# hi"), options)
            .await
            .unwrap();
        assert_eq!(response.path, "notes/readme");
        assert_eq!(disk.get("notes/readme").await.unwrap(), "# hi");
    }

    #[tokio::test]
    async fn urls_use_base_url_when_set() {
        let dir = TempDir::new().unwrap();
        let config = LocalConfig::new(dir.path()).with_base_url("https://cdn.example.com/files/");
        let disk = LocalDriver::new("public", config).unwrap();

        assert_eq!(
            disk.url("a/b.txt").await.unwrap(),
            "https://cdn.example.com/files/a/b.txt"
        );
        assert_eq!(
            disk.signed_url("a/b.txt", Duration::from_secs(60))
                .await
                .unwrap(),
            "https://cdn.example.com/files/a/b.txt"
        );
    }

    #[tokio::test]
    async fn urls_fall_back_to_file_paths() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        let url = disk.url("a/b.txt").await.unwrap();
        assert!(url.ends_with("b.txt"));
        assert!(PathBuf::from(url).starts_with(disk.root()));
    }

    #[tokio::test]
    async fn prefix_scopes_the_disk() {
        let dir = TempDir::new().unwrap();
        let config = LocalConfig::new(dir.path()).with_prefix("uploads");
        let disk = LocalDriver::new("scoped", config).unwrap();

        disk.put("a.txt", Bytes::from_static(b"x"), FileOptions::default())
            .await
            .unwrap();
        assert!(dir.path().join("uploads/a.txt").is_file());
    }

    #[tokio::test]
    async fn rejects_invalid_paths() {
        let dir = TempDir::new().unwrap();
        let disk = driver(&dir);

        let err = disk
            .put("../escape.txt", Bytes::new(), FileOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        assert!(disk.read("dir/").await.is_failed());
        assert!(disk.move_file("", "b.txt").await.is_err());
    }
}
