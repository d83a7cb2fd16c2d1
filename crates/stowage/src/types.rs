//! Request options and normalized responses shared by every driver.

use serde::{Deserialize, Serialize};

/// Options accepted by `put`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    /// MIME type to store; inferred from the extension when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Normalized object metadata.
///
/// Every field is optional. The empty value (serialized as `{}`) stands for
/// a missing object on every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Object path within the disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Content type / MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,
    /// Entity tag reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl FileMetadata {
    /// Returns whether this is the "not found" value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Maps backend metadata for `path`.
    ///
    /// The content type falls back to the one inferred from the extension
    /// for backends that do not store it.
    pub(crate) fn from_backend(path: &str, meta: &opendal::Metadata) -> Self {
        // Convert chrono DateTime to jiff Timestamp
        let last_modified = meta
            .last_modified()
            .and_then(|dt| jiff::Timestamp::from_second(dt.timestamp()).ok());

        let content_type = meta
            .content_type()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| mime_from_extension(path));

        Self {
            path: Some(path.to_owned()),
            content_type: Some(content_type),
            content_length: Some(meta.content_length()),
            last_modified,
            etag: meta.etag().map(ToOwned::to_owned),
        }
    }
}

/// Result of a `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutFileResponse {
    /// URL the object can be reached at.
    pub url: String,
    /// Path the object was written to.
    pub path: String,
}

/// Result of a `copy` or `move_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFileResponse {
    /// URL of the new object.
    pub url: String,
    /// Path of the new object.
    pub path: String,
    /// Whether the source object still exists.
    pub source_retained: bool,
}

impl RenameFileResponse {
    /// Response for a copy, which always keeps its source.
    pub fn copied(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            source_retained: true,
        }
    }

    /// Marks the source as removed.
    pub fn with_source_removed(mut self) -> Self {
        self.source_retained = false;
        self
    }
}

/// Infers a MIME type from the extension of `path`.
pub fn mime_from_extension(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}
