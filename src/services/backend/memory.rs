//! In-process `ObjectBackend` for tests and local development.
//!
//! Objects live in an ordered map behind an async `RwLock`, so listing comes
//! back sorted like S3 ListObjectsV2. Deletes can be made to linger for a
//! number of `head` calls to mimic eventually consistent stores.

use super::{BackendError, BackendResult, ByteStream, ObjectBackend};
use crate::models::{
    object::{ObjectHead, ObjectKey},
    signed_url::SignedUrlOptions,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::{
    collections::{BTreeMap, HashMap},
    io::Cursor,
    sync::Arc,
};
use tokio::sync::RwLock;
use tokio_util::io::ReaderStream;
use tracing::debug;

#[derive(Clone, Debug)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn head(&self) -> ObjectHead {
        ObjectHead {
            size: self.body.len() as i64,
            content_type: Some(self.content_type.clone()),
            content_disposition: None,
            last_modified: Some(self.last_modified),
            metadata: HashMap::new(),
            etag: Some(self.etag.clone()),
        }
    }
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    /// Deleted objects still answering `head`, with the remaining count.
    lingering: HashMap<String, (StoredObject, usize)>,
}

/// Bucket held entirely in memory.
///
/// Clones share the same contents.
#[derive(Clone)]
pub struct MemoryBackend {
    bucket: String,
    delete_visibility: usize,
    state: Arc<RwLock<State>>,
}

impl MemoryBackend {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            delete_visibility: 0,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Keep deleted objects visible to the next `polls` calls of `head`.
    pub fn with_delete_visibility(mut self, polls: usize) -> Self {
        self.delete_visibility = polls;
        self
    }

    /// Number of live objects.
    pub async fn len(&self) -> usize {
        self.state.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &ObjectKey, body: Bytes, content_type: &str) -> BackendResult<()> {
        let object = StoredObject {
            etag: format!("{:x}", md5::compute(&body)),
            body,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
        };

        let mut state = self.state.write().await;
        state.lingering.remove(key.as_str());
        state.objects.insert(key.as_str().to_string(), object);
        debug!("stored {} in memory bucket {}", key, self.bucket);
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> BackendResult<ByteStream> {
        let state = self.state.read().await;
        let object = state
            .objects
            .get(key.as_str())
            .ok_or_else(|| BackendError::not_found(&self.bucket, key.as_str()))?;

        Ok(ReaderStream::new(Cursor::new(object.body.clone())).boxed())
    }

    async fn head(&self, key: &ObjectKey) -> BackendResult<ObjectHead> {
        let mut state = self.state.write().await;
        if let Some(object) = state.objects.get(key.as_str()) {
            return Ok(object.head());
        }

        let Some((object, remaining)) = state.lingering.get_mut(key.as_str()) else {
            return Err(BackendError::not_found(&self.bucket, key.as_str()));
        };
        let head = object.head();
        *remaining -= 1;
        if *remaining == 0 {
            state.lingering.remove(key.as_str());
        }
        Ok(head)
    }

    async fn list(&self, prefix: &str) -> BackendResult<Vec<ObjectKey>> {
        let state = self.state.read().await;
        let keys = state
            .objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| ObjectKey::new(key.as_str()))
            .collect();
        Ok(keys)
    }

    async fn delete(&self, key: &ObjectKey) -> BackendResult<()> {
        let mut state = self.state.write().await;
        if let Some(object) = state.objects.remove(key.as_str()) {
            if self.delete_visibility > 0 {
                state
                    .lingering
                    .insert(key.as_str().to_string(), (object, self.delete_visibility));
            }
        }
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &ObjectKey,
        options: &SignedUrlOptions,
    ) -> BackendResult<String> {
        let mut url = format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            key,
            options.expires_in.as_secs()
        );
        if let Some(content_type) = &options.content_type {
            url.push_str("&response-content-type=");
            url.push_str(&urlencoding::encode(content_type));
        }
        if let Some(disposition) = &options.content_disposition {
            url.push_str("&response-content-disposition=");
            url.push_str(&urlencoding::encode(disposition));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::time::Duration;

    async fn read_all(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn put_then_get_returns_body() {
        let backend = MemoryBackend::new("test");
        let key = ObjectKey::new("docs/a.txt");
        backend.put(&key, Bytes::from_static(b"hello"), "text/plain").await.unwrap();

        let body = read_all(backend.get(&key).await.unwrap()).await;
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn large_body_streams_in_chunks() {
        let backend = MemoryBackend::new("test");
        let key = ObjectKey::new("big.bin");
        let payload = vec![7u8; 20_000];
        backend.put(&key, Bytes::from(payload.clone()), "application/octet-stream").await.unwrap();

        let chunks: Vec<Bytes> = backend.get(&key).await.unwrap().try_collect().await.unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), payload);
    }

    #[tokio::test]
    async fn head_reports_size_type_and_md5_etag() {
        let backend = MemoryBackend::new("test");
        let key = ObjectKey::new("a.csv");
        backend.put(&key, Bytes::from_static(b"a,b\n1,2\n"), "text/csv").await.unwrap();

        let head = backend.head(&key).await.unwrap();
        assert_eq!(head.size, 8);
        assert_eq!(head.content_type.as_deref(), Some("text/csv"));
        assert_eq!(head.etag, Some(format!("{:x}", md5::compute(b"a,b\n1,2\n"))));
        assert!(head.last_modified.is_some());
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let backend = MemoryBackend::new("test");
        let key = ObjectKey::new("nope");
        assert!(backend.head(&key).await.unwrap_err().is_not_found());
        assert!(backend.get(&key).await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn list_filters_by_prefix_in_order() {
        let backend = MemoryBackend::new("test");
        for key in ["b/2.txt", "a/1.txt", "b/1.txt", "bb/1.txt", "c.txt"] {
            backend.put(&ObjectKey::new(key), Bytes::new(), "text/plain").await.unwrap();
        }

        let keys = backend.list("b/").await.unwrap();
        let keys: Vec<&str> = keys.iter().map(ObjectKey::as_str).collect();
        assert_eq!(keys, vec!["b/1.txt", "b/2.txt"]);

        assert_eq!(backend.list("").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryBackend::new("test");
        let key = ObjectKey::new("a.txt");
        backend.put(&key, Bytes::new(), "text/plain").await.unwrap();

        backend.delete(&key).await.unwrap();
        backend.delete(&key).await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn deleted_object_lingers_for_configured_heads() {
        let backend = MemoryBackend::new("test").with_delete_visibility(2);
        let key = ObjectKey::new("a.txt");
        backend.put(&key, Bytes::from_static(b"x"), "text/plain").await.unwrap();
        backend.delete(&key).await.unwrap();

        assert!(backend.head(&key).await.is_ok());
        assert!(backend.head(&key).await.is_ok());
        assert!(backend.head(&key).await.unwrap_err().is_not_found());
        assert!(backend.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn presign_carries_expiry_and_overrides() {
        let backend = MemoryBackend::new("test");
        let options = SignedUrlOptions::default()
            .with_expiry(Duration::from_secs(60))
            .with_content_type("text/csv")
            .with_content_disposition("attachment; filename=\"a.csv\"");

        let url = backend.presign_get(&ObjectKey::new("a.csv"), &options).await.unwrap();
        assert_eq!(
            url,
            "memory://test/a.csv?expires_in=60&response-content-type=text%2Fcsv\
             &response-content-disposition=attachment%3B%20filename%3D%22a.csv%22"
        );
    }
}
