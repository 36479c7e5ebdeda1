//! src/services/gateway.rs
//!
//! StorageGateway - the operations callers use against the configured bucket:
//! upload, presigned download URLs, metadata, streaming download, listing and
//! confirmed deletion. Objects are addressed by hosted URL; keys are derived
//! with `object_key` and new names pass through `file_name` first.

use crate::{
    models::{
        object::{FileMetadata, ObjectKey},
        signed_url::{MAX_SIGNED_URL_EXPIRY, SignedUrlOptions},
    },
    services::{
        backend::{BackendError, ByteStream, ObjectBackend},
        file_name::{content_type_for, sanitize_file_name},
        object_key::{self, KeyError, is_addressable, join_key, resolve_key},
    },
};
use bytes::Bytes;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// How long `delete` waits for the object to disappear.
pub const DEFAULT_DELETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between existence checks while confirming a delete.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("hosted url `{0}` does not name an object")]
    EmptyKey(String),
    #[error("signed url expiry {requested:?} exceeds the maximum of {max:?}")]
    ExpiryTooLong { requested: Duration, max: Duration },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("deletion of `{key}` in bucket `{bucket}` not confirmed within {waited:?}")]
    DeletionTimeout {
        bucket: String,
        key: String,
        waited: Duration,
    },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Entry point for all object operations against one bucket.
///
/// Holds no per-request state; clones share the backend and can serve
/// concurrent callers.
#[derive(Clone)]
pub struct StorageGateway {
    backend: Arc<dyn ObjectBackend>,
    domain: String,
    deletion_timeout: Duration,
    poll_interval: Duration,
}

impl StorageGateway {
    /// Create a gateway over `backend`, publishing hosted URLs as
    /// `https://{bucket}.{domain}/{key}`.
    pub fn new(backend: Arc<dyn ObjectBackend>, domain: impl Into<String>) -> Self {
        Self {
            backend,
            domain: domain.into(),
            deletion_timeout: DEFAULT_DELETION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_deletion_timeout(mut self, timeout: Duration) -> Self {
        self.deletion_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn bucket(&self) -> &str {
        self.backend.bucket()
    }

    /// Public URL under which `key` is served.
    pub fn hosted_url(&self, key: &ObjectKey) -> String {
        object_key::hosted_url(self.bucket(), &self.domain, key)
    }

    /// Resolve a hosted URL to a non-empty key.
    fn object_key(&self, hosted_url: &str) -> GatewayResult<ObjectKey> {
        let key = resolve_key(hosted_url)?;
        if key.is_empty() {
            return Err(GatewayError::EmptyKey(hosted_url.to_string()));
        }
        Ok(key)
    }

    /// Store `body` as `{path}/{sanitized file_name}` and return its hosted URL.
    ///
    /// The content type is picked from the sanitized extension.
    #[instrument(skip(self, body), fields(bucket = %self.bucket(), size = body.len()))]
    pub async fn upload(&self, path: &str, file_name: &str, body: Bytes) -> GatewayResult<String> {
        let sanitized = sanitize_file_name(file_name);
        let key = join_key(path, &sanitized)?;
        let content_type = content_type_for(&sanitized);

        self.backend
            .put(&key, body, content_type)
            .await
            .inspect_err(|err| warn!(key = %key, error = %err, "upload failed"))?;

        debug!(key = %key, content_type, "uploaded object");
        Ok(self.hosted_url(&key))
    }

    /// Presigned GET URL for the object; `None` uses the default options.
    #[instrument(skip(self, options), fields(bucket = %self.bucket()))]
    pub async fn signed_url(
        &self,
        hosted_url: &str,
        options: Option<SignedUrlOptions>,
    ) -> GatewayResult<String> {
        let options = options.unwrap_or_default();
        if options.expires_in > MAX_SIGNED_URL_EXPIRY {
            return Err(GatewayError::ExpiryTooLong {
                requested: options.expires_in,
                max: MAX_SIGNED_URL_EXPIRY,
            });
        }

        let key = self.object_key(hosted_url)?;
        let url = self.backend.presign_get(&key, &options).await?;
        debug!(key = %key, expires_in = ?options.expires_in, "presigned object url");
        Ok(url)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    pub async fn metadata(&self, hosted_url: &str) -> GatewayResult<FileMetadata> {
        let key = self.object_key(hosted_url)?;
        let head = self.backend.head(&key).await?;
        Ok(FileMetadata::from_head(head, &key, hosted_url))
    }

    /// Open the object body as a byte stream.
    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    pub async fn file_stream(&self, hosted_url: &str) -> GatewayResult<ByteStream> {
        let key = self.object_key(hosted_url)?;
        Ok(self.backend.get(&key).await?)
    }

    /// Hosted URLs of every object whose key starts with `prefix`.
    ///
    /// Keys with `.` or `..` segments, which only other writers can create,
    /// have no hosted URL that resolves back to them and are left out.
    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    pub async fn list(&self, prefix: &str) -> GatewayResult<Vec<String>> {
        let keys = self.backend.list(prefix).await?;
        debug!(count = keys.len(), "listed objects");

        let urls = keys
            .iter()
            .filter(|key| {
                let addressable = is_addressable(key);
                if !addressable {
                    warn!(key = %key, "skipping key without a resolvable hosted url");
                }
                addressable
            })
            .map(|key| self.hosted_url(key))
            .collect();
        Ok(urls)
    }

    /// Delete the object and wait until the backend stops reporting it.
    ///
    /// Fails with [`GatewayError::DeletionTimeout`] if the object is still
    /// visible once the deletion timeout elapses.
    #[instrument(skip(self), fields(bucket = %self.bucket()))]
    pub async fn delete(&self, hosted_url: &str) -> GatewayResult<()> {
        let key = self.object_key(hosted_url)?;
        self.backend
            .delete(&key)
            .await
            .inspect_err(|err| warn!(key = %key, error = %err, "delete failed"))?;
        self.wait_until_gone(&key).await
    }

    async fn wait_until_gone(&self, key: &ObjectKey) -> GatewayResult<()> {
        let poll = async {
            loop {
                match self.backend.head(key).await {
                    Err(err) if err.is_not_found() => return Ok::<(), GatewayError>(()),
                    Err(err) => return Err(err.into()),
                    Ok(_) => {
                        debug!(key = %key, "object still visible after delete");
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        };

        match tokio::time::timeout(self.deletion_timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key = %key, "deletion not confirmed in time");
                Err(GatewayError::DeletionTimeout {
                    bucket: self.bucket().to_string(),
                    key: key.to_string(),
                    waited: self.deletion_timeout,
                })
            }
        }
    }

    /// Check that the bucket answers requests.
    ///
    /// Heads a random key: both "found" and "not found" mean the backend is
    /// reachable and authorized.
    pub async fn check_reachable(&self) -> GatewayResult<()> {
        let probe = ObjectKey::new(format!(".readyz-{}", Uuid::new_v4()));
        match self.backend.head(&probe).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
