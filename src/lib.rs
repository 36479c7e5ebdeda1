//! bucket-gateway - upload, presign, inspect, stream, list and delete objects
//! in a single storage bucket.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use config::AppConfig;
pub use services::gateway::{GatewayError, StorageGateway};
