//! Defines routes for all gateway operations.
//!
//! ## Structure
//! - **Health endpoints**
//!   - `GET    /healthz` - liveness
//!   - `GET    /readyz` - bucket reachability
//!
//! - **Object endpoints** (objects addressed by hosted URL in `?url=`)
//!   - `POST   /objects` - multipart upload
//!   - `GET    /objects?prefix=` - list hosted URLs
//!   - `DELETE /objects?url=` - delete and confirm
//!   - `GET    /objects/signed-url?url=` - presigned download URL
//!   - `GET    /objects/metadata?url=` - metadata only
//!   - `GET    /objects/download?url=` - stream the body

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        object_handlers::{
            delete_object, download_object, list_objects, object_metadata, signed_url,
            upload_object,
        },
    },
    services::gateway::StorageGateway,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build and return the router for all gateway routes.
///
/// The router carries shared state (`StorageGateway`) to all handlers.
pub fn routes() -> Router<StorageGateway> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Object routes
        .route(
            "/objects",
            post(upload_object)
                .get(list_objects)
                .delete(delete_object)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/objects/signed-url", get(signed_url))
        .route("/objects/metadata", get(object_metadata))
        .route("/objects/download", get(download_object))
}
