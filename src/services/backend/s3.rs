//! src/services/backend/s3.rs
//!
//! `ObjectBackend` over aws-sdk-s3. Retries, signing, credentials and
//! pagination all come from the SDK; this file only maps gateway calls onto
//! SDK requests and SDK errors onto `BackendError`.

use super::{BackendError, BackendResult, ByteStream, ObjectBackend, Operation};
use crate::{
    config::AppConfig,
    models::{
        object::{ObjectHead, ObjectKey},
        signed_url::SignedUrlOptions,
    },
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::Region,
    presigning::PresigningConfig,
    primitives::ByteStream as S3Body,
};
use bytes::Bytes;
use chrono::DateTime;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// S3 (or S3-compatible) bucket accessed through the AWS SDK.
///
/// Clone is cheap - the SDK client is reference counted internally.
#[derive(Clone, Debug)]
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the default credential chain and the configured
    /// region.
    ///
    /// A custom endpoint (MinIO, LocalStack, ...) switches to path-style
    /// addressing, which those deployments expect.
    pub async fn connect(config: &AppConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            debug!("using custom S3 endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &ObjectKey, body: Bytes, content_type: &str) -> BackendResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(S3Body::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| BackendError::request(Operation::Put, &self.bucket, key.as_str(), err))?;
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> BackendResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_no_such_key());
                if missing {
                    BackendError::not_found(&self.bucket, key.as_str())
                } else {
                    BackendError::request(Operation::Get, &self.bucket, key.as_str(), err)
                }
            })?;

        Ok(ReaderStream::new(output.body.into_async_read()).boxed())
    }

    async fn head(&self, key: &ObjectKey) -> BackendResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| {
                let missing = err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_not_found());
                if missing {
                    BackendError::not_found(&self.bucket, key.as_str())
                } else {
                    BackendError::request(Operation::Head, &self.bucket, key.as_str(), err)
                }
            })?;

        Ok(ObjectHead {
            size: output.content_length().unwrap_or_default(),
            content_type: output.content_type().map(str::to_string),
            content_disposition: output.content_disposition().map(str::to_string),
            last_modified: output
                .last_modified()
                .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())),
            metadata: output.metadata().cloned().unwrap_or_default(),
            etag: output.e_tag().map(|etag| etag.trim_matches('"').to_string()),
        })
    }

    async fn list(&self, prefix: &str) -> BackendResult<Vec<ObjectKey>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|err| BackendError::request(Operation::List, &self.bucket, prefix, err))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(ObjectKey::new),
            );
        }

        Ok(keys)
    }

    async fn delete(&self, key: &ObjectKey) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| {
                BackendError::request(Operation::Delete, &self.bucket, key.as_str(), err)
            })?;
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &ObjectKey,
        options: &SignedUrlOptions,
    ) -> BackendResult<String> {
        let presigning = PresigningConfig::expires_in(options.expires_in).map_err(|err| {
            BackendError::request(Operation::PresignGet, &self.bucket, key.as_str(), err)
        })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .set_response_content_type(options.content_type.clone())
            .set_response_content_disposition(options.content_disposition.clone())
            .presigned(presigning)
            .await
            .map_err(|err| {
                BackendError::request(Operation::PresignGet, &self.bucket, key.as_str(), err)
            })?;

        Ok(presigned.uri().to_string())
    }
}
