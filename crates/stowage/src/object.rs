//! Operator helpers shared by the drivers.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::Operator;
use opendal::layers::LoggingLayer;

use crate::TRACING_TARGET_DRIVER;
use crate::config::MAX_URL_EXPIRY_SECS;
use crate::error::{StorageError, StorageResult};

/// Shortest signed URL lifetime accepted by S3.
pub(crate) const MIN_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(1);

/// Longest signed URL lifetime accepted by S3.
pub(crate) const MAX_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(MAX_URL_EXPIRY_SECS);

/// Finishes an operator, adding call logging for debug disks.
pub(crate) fn finish_operator(
    builder: impl opendal::Builder,
    debug: bool,
) -> StorageResult<Operator> {
    let operator = Operator::new(builder)
        .map(|op| op.finish())
        .map_err(|e| StorageError::config(e.to_string()))?;

    Ok(if debug {
        operator.layer(LoggingLayer::default())
    } else {
        operator
    })
}

/// Checks a signed URL lifetime against the range S3 accepts.
pub(crate) fn check_expiry(expires_in: Duration) -> StorageResult<()> {
    if (MIN_SIGNED_URL_EXPIRY..=MAX_SIGNED_URL_EXPIRY).contains(&expires_in) {
        Ok(())
    } else {
        Err(StorageError::InvalidExpiry {
            expires_in,
            min: MIN_SIGNED_URL_EXPIRY,
            max: MAX_SIGNED_URL_EXPIRY,
        })
    }
}

/// Presigns a GET request for `key`.
pub(crate) async fn presign(
    operator: &Operator,
    key: &str,
    expires_in: Duration,
) -> StorageResult<String> {
    check_expiry(expires_in)?;

    let request = operator.presign_read(key, expires_in).await?;
    Ok(request.uri().to_string())
}

/// Version of a copy source observed before its content is fetched.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceVersion {
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Object operations the etag-guarded copy is built from.
#[async_trait]
pub(crate) trait CopySource: Send + Sync {
    /// Observes the current version of the object at `path`.
    async fn version(&self, path: &str) -> StorageResult<SourceVersion>;

    /// Reads `path`, failing unless its etag still is `etag`.
    async fn read_matching(&self, path: &str, etag: &str) -> StorageResult<Bytes>;

    async fn write_object(
        &self,
        path: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()>;

    /// Server-side copy, used for objects without an etag.
    async fn copy_object(&self, from: &str, to: &str) -> StorageResult<()>;
}

#[async_trait]
impl CopySource for Operator {
    async fn version(&self, path: &str) -> StorageResult<SourceVersion> {
        let meta = self.stat(path).await?;
        Ok(SourceVersion {
            etag: meta.etag().map(ToOwned::to_owned),
            content_type: meta.content_type().map(ToOwned::to_owned),
        })
    }

    async fn read_matching(&self, path: &str, etag: &str) -> StorageResult<Bytes> {
        let buffer = self.read_with(path).if_match(etag).await?;
        Ok(buffer.to_bytes())
    }

    async fn write_object(
        &self,
        path: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        let mut write = self.write_with(path, content);
        if let Some(content_type) = content_type {
            write = write.content_type(content_type);
        }
        write.await?;
        Ok(())
    }

    async fn copy_object(&self, from: &str, to: &str) -> StorageResult<()> {
        self.copy(from, to).await?;
        Ok(())
    }
}

/// Copies `from` to `to`, guarded by the etag the source has right now.
///
/// The content is fetched with an `If-Match` on the observed etag, so a
/// concurrent overwrite of the source fails the copy instead of producing a
/// mix of versions. Objects without an etag use a plain server-side copy.
/// Callers reject identical paths first, the etag branch has no same-path
/// guard of its own.
pub(crate) async fn guarded_copy(
    source: &impl CopySource,
    from: &str,
    to: &str,
) -> StorageResult<()> {
    let version = source.version(from).await?;

    let Some(etag) = version.etag.as_deref() else {
        return source.copy_object(from, to).await;
    };

    tracing::debug!(
        target: TRACING_TARGET_DRIVER,
        from = %from,
        to = %to,
        etag = %etag,
        "Copying object matching etag"
    );

    let content = source.read_matching(from, etag).await?;
    source
        .write_object(to, content, version.content_type.as_deref())
        .await
}

/// Joins a public URL root, a prefix and an object key.
pub(crate) fn public_url(root: &str, prefix: Option<&str>, key: &str) -> String {
    let root = root.trim_end_matches('/');
    match prefix {
        Some(prefix) => format!("{root}/{prefix}/{key}"),
        None => format!("{root}/{key}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    struct Object {
        content: Bytes,
        etag: Option<String>,
        content_type: Option<String>,
    }

    /// In-memory object store with etags and an optional writer that
    /// overwrites the source between the stat and the read.
    #[derive(Debug, Default)]
    struct VersionedStore {
        objects: Mutex<HashMap<String, Object>>,
        overwrite_before_read: Mutex<Option<(String, Object)>>,
        server_copies: Mutex<Vec<(String, String)>>,
    }

    impl VersionedStore {
        fn with(self, path: &str, object: Object) -> Self {
            self.objects.lock().unwrap().insert(path.to_owned(), object);
            self
        }

        fn object(&self, path: &str) -> Option<Object> {
            self.objects.lock().unwrap().get(path).cloned()
        }
    }

    fn object(content: &'static [u8], etag: Option<&str>, content_type: Option<&str>) -> Object {
        Object {
            content: Bytes::from_static(content),
            etag: etag.map(ToOwned::to_owned),
            content_type: content_type.map(ToOwned::to_owned),
        }
    }

    #[async_trait]
    impl CopySource for VersionedStore {
        async fn version(&self, path: &str) -> StorageResult<SourceVersion> {
            let object = self.object(path).ok_or_else(|| StorageError::not_found(path))?;
            Ok(SourceVersion {
                etag: object.etag,
                content_type: object.content_type,
            })
        }

        async fn read_matching(&self, path: &str, etag: &str) -> StorageResult<Bytes> {
            if let Some((overwritten, object)) = self.overwrite_before_read.lock().unwrap().take() {
                self.objects.lock().unwrap().insert(overwritten, object);
            }

            let object = self.object(path).ok_or_else(|| StorageError::not_found(path))?;
            if object.etag.as_deref() != Some(etag) {
                return Err(StorageError::ConditionNotMatch(path.to_owned()));
            }
            Ok(object.content)
        }

        async fn write_object(
            &self,
            path: &str,
            content: Bytes,
            content_type: Option<&str>,
        ) -> StorageResult<()> {
            let written = Object {
                content,
                etag: Some(format!("written-{path}")),
                content_type: content_type.map(ToOwned::to_owned),
            };
            self.objects.lock().unwrap().insert(path.to_owned(), written);
            Ok(())
        }

        async fn copy_object(&self, from: &str, to: &str) -> StorageResult<()> {
            let object = self.object(from).ok_or_else(|| StorageError::not_found(from))?;
            self.objects.lock().unwrap().insert(to.to_owned(), object);
            self.server_copies
                .lock()
                .unwrap()
                .push((from.to_owned(), to.to_owned()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn copies_when_etag_matches() {
        let store = VersionedStore::default().with(
            "a.pdf",
            object(b"v1", Some("\"v1\""), Some("application/pdf")),
        );

        guarded_copy(&store, "a.pdf", "b.pdf").await.unwrap();

        let copied = store.object("b.pdf").unwrap();
        assert_eq!(copied.content, "v1");
        assert_eq!(copied.content_type.as_deref(), Some("application/pdf"));
        assert!(store.server_copies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_overwrite_fails_the_copy() {
        let store = VersionedStore::default().with("a.txt", object(b"v1", Some("v1"), None));
        *store.overwrite_before_read.lock().unwrap() =
            Some(("a.txt".to_owned(), object(b"v2", Some("v2"), None)));

        let err = guarded_copy(&store, "a.txt", "b.txt").await.unwrap_err();

        assert!(matches!(err, StorageError::ConditionNotMatch(_)), "{err}");
        assert!(store.object("b.txt").is_none());
        assert_eq!(store.object("a.txt").unwrap().content, "v2");
    }

    #[tokio::test]
    async fn copies_server_side_without_etag() {
        let store = VersionedStore::default().with("a.txt", object(b"data", None, None));

        guarded_copy(&store, "a.txt", "b.txt").await.unwrap();

        assert_eq!(store.object("b.txt").unwrap().content, "data");
        assert_eq!(
            *store.server_copies.lock().unwrap(),
            [("a.txt".to_owned(), "b.txt".to_owned())]
        );
    }

    #[tokio::test]
    async fn copy_of_missing_source_fails() {
        let store = VersionedStore::default();

        let err = guarded_copy(&store, "a.txt", "b.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn operator_copies_objects_without_etag() {
        let operator = Operator::new(opendal::services::Memory::default())
            .unwrap()
            .finish();
        operator
            .write("a.txt", Bytes::from_static(b"data"))
            .await
            .unwrap();

        guarded_copy(&operator, "a.txt", "b.txt").await.unwrap();

        assert_eq!(operator.read("b.txt").await.unwrap().to_bytes(), "data");
        assert!(operator.exists("a.txt").await.unwrap());
    }

    #[test]
    fn accepts_expiry_within_range() {
        assert!(check_expiry(Duration::from_secs(1)).is_ok());
        assert!(check_expiry(Duration::from_secs(604_800)).is_ok());
    }

    #[test]
    fn rejects_expiry_out_of_range() {
        assert!(matches!(
            check_expiry(Duration::ZERO),
            Err(StorageError::InvalidExpiry { .. })
        ));
        assert!(matches!(
            check_expiry(Duration::from_secs(604_801)),
            Err(StorageError::InvalidExpiry { .. })
        ));
    }

    #[test]
    fn joins_public_urls() {
        assert_eq!(
            public_url("https://cdn.example.com/", Some("uploads"), "a/b.txt"),
            "https://cdn.example.com/uploads/a/b.txt"
        );
        assert_eq!(
            public_url("https://cdn.example.com", None, "b.txt"),
            "https://cdn.example.com/b.txt"
        );
    }
}
