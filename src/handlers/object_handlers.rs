//! HTTP handlers for object operations.
//! Objects are addressed by their hosted URL in the `url` query parameter;
//! downloads stream the body without buffering it in memory.

use crate::{
    errors::AppError,
    models::{object::FileMetadata, signed_url::SignedUrlOptions},
    services::gateway::StorageGateway,
};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Query params naming a single object.
#[derive(Debug, Deserialize)]
pub struct ObjectUrlQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    #[serde(default)]
    pub prefix: String,
}

/// Query params accepted by the signed-url endpoint.
#[derive(Debug, Deserialize)]
pub struct SignedUrlQuery {
    pub url: String,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub expires_in_secs: Option<u64>,
}

impl SignedUrlQuery {
    fn options(&self) -> SignedUrlOptions {
        let mut options = SignedUrlOptions::default();
        if let Some(content_type) = &self.content_type {
            options = options.with_content_type(content_type.as_str());
        }
        if let Some(disposition) = &self.content_disposition {
            options = options.with_content_disposition(disposition.as_str());
        }
        if let Some(secs) = self.expires_in_secs {
            options = options.with_expiry(Duration::from_secs(secs));
        }
        options
    }
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ListObjectsResponse {
    pub objects: Vec<String>,
}

/// `POST /objects` - multipart upload with a `path` text field and a `file` part.
pub async fn upload_object(
    State(gateway): State<StorageGateway>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut path = String::new();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("path") => {
                path = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                file = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(AppError::bad_request("multipart field `file` is required"));
    };

    let url = gateway.upload(&path, &file_name, bytes).await?;
    Ok((StatusCode::CREATED, Json(UrlResponse { url })))
}

/// `GET /objects?prefix=` - hosted URLs of matching objects.
pub async fn list_objects(
    State(gateway): State<StorageGateway>,
    Query(q): Query<ListObjectsQuery>,
) -> Result<Json<ListObjectsResponse>, AppError> {
    let objects = gateway.list(&q.prefix).await?;
    Ok(Json(ListObjectsResponse { objects }))
}

/// `GET /objects/signed-url?url=` - presigned download URL.
pub async fn signed_url(
    State(gateway): State<StorageGateway>,
    Query(q): Query<SignedUrlQuery>,
) -> Result<Json<UrlResponse>, AppError> {
    let url = gateway.signed_url(&q.url, Some(q.options())).await?;
    Ok(Json(UrlResponse { url }))
}

/// `GET /objects/metadata?url=`
pub async fn object_metadata(
    State(gateway): State<StorageGateway>,
    Query(q): Query<ObjectUrlQuery>,
) -> Result<Json<FileMetadata>, AppError> {
    let meta = gateway.metadata(&q.url).await?;
    Ok(Json(meta))
}

/// `GET /objects/download?url=` - object body as a streaming response.
pub async fn download_object(
    State(gateway): State<StorageGateway>,
    Query(q): Query<ObjectUrlQuery>,
) -> Result<Response, AppError> {
    let stream = gateway.file_stream(&q.url).await?;

    let mut response = Response::new(Body::from_stream(stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    Ok(response)
}

/// `DELETE /objects?url=` - delete and wait for confirmation.
pub async fn delete_object(
    State(gateway): State<StorageGateway>,
    Query(q): Query<ObjectUrlQuery>,
) -> Result<StatusCode, AppError> {
    gateway.delete(&q.url).await?;
    Ok(StatusCode::NO_CONTENT)
}
