//! Object storage backends.
//!
//! The gateway talks to storage only through [`ObjectBackend`]. Production
//! uses [`S3Backend`] (aws-sdk-s3); tests and local runs use
//! [`MemoryBackend`]. Backends own their bucket, so keys are the only
//! addressing the gateway passes down.

pub mod memory;
pub mod s3;

pub use memory::MemoryBackend;
pub use s3::S3Backend;

use crate::models::{
    object::{ObjectHead, ObjectKey},
    signed_url::SignedUrlOptions,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::{fmt, io};
use thiserror::Error;

/// Streaming object body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Backend call that failed, reported alongside the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Put,
    Get,
    Head,
    List,
    Delete,
    PresignGet,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Put => "put_object",
            Operation::Get => "get_object",
            Operation::Head => "head_object",
            Operation::List => "list_objects",
            Operation::Delete => "delete_object",
            Operation::PresignGet => "presign_get_object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("object `{key}` not found in bucket `{bucket}`")]
    NotFound { bucket: String, key: String },
    #[error("{operation} failed for `{key}` in bucket `{bucket}`: {source}")]
    Request {
        operation: Operation,
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },
}

impl BackendError {
    pub fn not_found(bucket: &str, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.into(),
        }
    }

    pub fn request(
        operation: Operation,
        bucket: &str,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Request {
            operation,
            bucket: bucket.to_string(),
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Capability set the gateway needs from object storage.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Bucket every call operates on.
    fn bucket(&self) -> &str;

    /// Store `body` under `key`, replacing any existing object.
    async fn put(&self, key: &ObjectKey, body: Bytes, content_type: &str) -> BackendResult<()>;

    /// Open the object body as a stream.
    ///
    /// Returns `BackendError::NotFound` if the object doesn't exist.
    async fn get(&self, key: &ObjectKey) -> BackendResult<ByteStream>;

    /// Fetch object metadata without the body.
    ///
    /// Returns `BackendError::NotFound` if the object doesn't exist.
    async fn head(&self, key: &ObjectKey) -> BackendResult<ObjectHead>;

    /// All keys starting with `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> BackendResult<Vec<ObjectKey>>;

    /// Delete the object. Deleting a missing key is not an error.
    async fn delete(&self, key: &ObjectKey) -> BackendResult<()>;

    /// Time-limited URL granting GET access to the object.
    async fn presign_get(
        &self,
        key: &ObjectKey,
        options: &SignedUrlOptions,
    ) -> BackendResult<String>;
}
