//! The storage driver contract shared by every backend.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use derive_more::Deref;
use opendal::Operator;

use crate::TRACING_TARGET_DRIVER;
use crate::config::{DiskConfig, DriverKind};
use crate::error::{StorageError, StorageResult};
use crate::lookup::Lookup;
use crate::types::{
    FileMetadata, FileOptions, PutFileResponse, RenameFileResponse, mime_from_extension,
};

/// Uniform file operations over one configured disk.
///
/// Only the identity accessors and URL generation are backend-specific;
/// everything else has a default built on the disk's [`Operator`], which
/// drivers override where their backend offers something better (a native
/// rename, an etag-guarded copy).
///
/// Read-style operations (`get`, `meta`, `exists`, `missing`, `delete`)
/// never fail: missing objects and backend errors turn into sentinel values.
/// Use [`read`](Self::read), [`stat`](Self::stat) or [`remove`](Self::remove)
/// to see the cause. Writes (`put`, `copy`, `move_file`) propagate errors.
#[async_trait]
pub trait StorageDriver: Send + Sync + fmt::Debug {
    /// Name of the disk this driver serves.
    fn disk(&self) -> &str;

    /// Configuration the driver was built from.
    fn config(&self) -> &DiskConfig;

    /// Backend-native handle for operations outside of this contract.
    fn client(&self) -> &Operator;

    /// Driver kind of this disk.
    fn kind(&self) -> DriverKind {
        self.config().kind()
    }

    /// URL the object at `path` can be reached at.
    async fn url(&self, path: &str) -> StorageResult<String>;

    /// Time-limited URL for the object at `path`.
    async fn signed_url(&self, path: &str, expires_in: Duration) -> StorageResult<String>;

    /// Writes `content` to `path`, replacing any existing object.
    async fn put(
        &self,
        path: &str,
        content: Bytes,
        options: FileOptions,
    ) -> StorageResult<PutFileResponse> {
        let path = validate_path(path)?;
        let mime_type = options
            .mime_type
            .unwrap_or_else(|| mime_from_extension(path));

        tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk(),
            path = %path,
            size = content.len(),
            mime_type = %mime_type,
            "Writing file"
        );

        let operator = self.client();
        if operator.info().full_capability().write_with_content_type {
            operator
                .write_with(path, content)
                .content_type(&mime_type)
                .await?;
        } else {
            operator.write(path, content).await?;
        }

        Ok(PutFileResponse {
            url: self.url(path).await?,
            path: path.to_owned(),
        })
    }

    /// Reads the full content at `path`.
    async fn read(&self, path: &str) -> Lookup<Bytes> {
        let result = match validate_path(path) {
            Ok(path) => self
                .client()
                .read(path)
                .await
                .map(|buffer| buffer.to_bytes())
                .map_err(StorageError::from),
            Err(err) => Err(err),
        };

        observe(self.disk(), "read", path, Lookup::from_result(result))
    }

    /// Reads the full content at `path`, or `None` when it cannot be read.
    async fn get(&self, path: &str) -> Option<Bytes> {
        self.read(path).await.into_option()
    }

    /// Fetches the metadata of the object at `path`.
    async fn stat(&self, path: &str) -> Lookup<FileMetadata> {
        let result = match validate_path(path) {
            Ok(key) => match self.client().stat(key).await {
                Ok(meta) if meta.is_dir() => Err(StorageError::not_found(key)),
                Ok(meta) => Ok(FileMetadata::from_backend(key, &meta)),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };

        observe(self.disk(), "stat", path, Lookup::from_result(result))
    }

    /// Fetches the metadata of the object at `path`, empty when unavailable.
    async fn meta(&self, path: &str) -> FileMetadata {
        self.stat(path).await.unwrap_or_default()
    }

    /// Returns whether an object exists at `path`.
    async fn exists(&self, path: &str) -> bool {
        !self.meta(path).await.is_empty()
    }

    /// Returns whether no object exists at `path`.
    async fn missing(&self, path: &str) -> bool {
        self.meta(path).await.is_empty()
    }

    /// Deletes the object at `path`.
    async fn remove(&self, path: &str) -> StorageResult<()> {
        let path = validate_path(path)?;

        tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk(),
            path = %path,
            "Deleting file"
        );

        self.client().delete(path).await?;
        Ok(())
    }

    /// Deletes the object at `path`, returning whether it succeeded.
    async fn delete(&self, path: &str) -> bool {
        match self.remove(path).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_DRIVER,
                    disk = %self.disk(),
                    path = %path,
                    error = %err,
                    "Delete failed"
                );
                false
            }
        }
    }

    /// Copies the object at `path` to `new_path` within this disk.
    async fn copy(&self, path: &str, new_path: &str) -> StorageResult<RenameFileResponse> {
        let (from, to) = validate_paths(path, new_path)?;

        tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk(),
            from = %from,
            to = %to,
            "Copying file"
        );

        self.client().copy(from, to).await?;
        Ok(RenameFileResponse::copied(to, self.url(to).await?))
    }

    /// Moves the object at `path` to `new_path` within this disk.
    ///
    /// Copies, then deletes the source. The two steps are not atomic: when
    /// the delete fails the move still succeeds with
    /// [`source_retained`](RenameFileResponse::source_retained) set, leaving
    /// the object at both paths. Moving an object onto itself is rejected
    /// before anything is written or deleted.
    async fn move_file(&self, path: &str, new_path: &str) -> StorageResult<RenameFileResponse> {
        validate_paths(path, new_path)?;
        let copied = self.copy(path, new_path).await?;

        if self.delete(path).await {
            return Ok(copied.with_source_removed());
        }

        tracing::warn!(
            target: TRACING_TARGET_DRIVER,
            disk = %self.disk(),
            from = %path,
            to = %new_path,
            "Move left the source in place"
        );

        Ok(copied)
    }
}

/// Shared handle to a disk's driver.
#[derive(Clone, Deref)]
pub struct Disk(Arc<dyn StorageDriver>);

impl Disk {
    /// Wraps a driver.
    pub fn new(driver: impl StorageDriver + 'static) -> Self {
        Self(Arc::new(driver))
    }
}

impl fmt::Debug for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Checks an object path, returning it without a leading slash.
pub(crate) fn validate_path(path: &str) -> StorageResult<&str> {
    let key = path.trim_start_matches('/');

    if key.is_empty() {
        return Err(StorageError::invalid_path("path cannot be empty"));
    }

    if key.ends_with('/') {
        return Err(StorageError::invalid_path(format!(
            "`{path}` names a directory"
        )));
    }

    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::invalid_path(format!(
            "`{path}` leaves the disk"
        )));
    }

    Ok(key)
}

/// Checks the source and destination of a copy or move.
pub(crate) fn validate_paths<'a>(
    from: &'a str,
    to: &'a str,
) -> StorageResult<(&'a str, &'a str)> {
    let from = validate_path(from)?;
    let to = validate_path(to)?;

    if from == to {
        return Err(StorageError::invalid_path("source and destination are the same"));
    }

    Ok((from, to))
}

/// Logs suppressed outcomes of a read-style operation.
fn observe<T>(disk: &str, operation: &'static str, path: &str, lookup: Lookup<T>) -> Lookup<T> {
    match &lookup {
        Lookup::Found(_) => {}
        Lookup::Absent => tracing::debug!(
            target: TRACING_TARGET_DRIVER,
            disk = %disk,
            operation,
            path = %path,
            "Object not found"
        ),
        Lookup::Failed(err) => tracing::warn!(
            target: TRACING_TARGET_DRIVER,
            disk = %disk,
            operation,
            path = %path,
            error = %err,
            "Read-style operation failed"
        ),
    }

    lookup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slash() {
        assert_eq!(validate_path("/a/b.txt").unwrap(), "a/b.txt");
        assert_eq!(validate_path("a.txt").unwrap(), "a.txt");
    }

    #[test]
    fn rejects_invalid_paths() {
        for path in ["", "/", "a/", "../a.txt", "a/../../b.txt"] {
            assert!(
                matches!(validate_path(path), Err(StorageError::InvalidPath(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_copy_onto_itself() {
        assert_eq!(
            validate_paths("/a.txt", "b.txt").unwrap(),
            ("a.txt", "b.txt")
        );

        for (from, to) in [("a.txt", "a.txt"), ("a.txt", "/a.txt"), ("//x/y", "x/y")] {
            assert!(
                matches!(validate_paths(from, to), Err(StorageError::InvalidPath(_))),
                "{from} -> {to} should be rejected"
            );
        }
    }
}
