//! HTTP handlers. Each one extracts its inputs, calls `StorageGateway` and
//! maps `GatewayError` through `AppError`.

pub mod health_handlers;
pub mod object_handlers;
