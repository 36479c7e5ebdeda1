//! Represents an object (file) stored in the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Path-like identifier of an object within the bucket, e.g. `reports/2025/q1.csv`.
///
/// Keys composed by the gateway are never empty and never start with `/`.
/// A key resolved from a hosted URL pointing at the bucket root is empty.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last path segment of the key, used as the display name.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Metadata a backend reports for a single object, without its body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// Size in bytes.
    pub size: i64,

    /// Content type (MIME type) recorded at upload.
    pub content_type: Option<String>,

    pub content_disposition: Option<String>,

    pub last_modified: Option<DateTime<Utc>>,

    /// User-defined metadata (`x-amz-meta-*` without the prefix).
    pub metadata: HashMap<String, String>,

    /// Entity tag with surrounding quotes removed.
    pub etag: Option<String>,
}

/// Object metadata as returned to gateway callers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size in bytes.
    pub size: i64,

    pub content_type: Option<String>,

    pub content_disposition: Option<String>,

    /// Timestamp when the object was last modified.
    pub last_modified: Option<DateTime<Utc>>,

    /// Free-form key/value metadata attached to the object.
    pub metadata: HashMap<String, String>,

    /// Hosted URL the metadata was requested for.
    pub hosted_url: String,

    /// Last path segment of the object key.
    pub name: String,
}

impl FileMetadata {
    pub fn from_head(head: ObjectHead, key: &ObjectKey, hosted_url: impl Into<String>) -> Self {
        Self {
            size: head.size,
            content_type: head.content_type,
            content_disposition: head.content_disposition,
            last_modified: head.last_modified,
            metadata: head.metadata,
            hosted_url: hosted_url.into(),
            name: key.file_name().to_string(),
        }
    }
}
