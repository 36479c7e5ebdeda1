use anyhow::Result;
use axum::Router;
use bucket_gateway::{
    config::{AppConfig, BackendKind},
    routes::routes::routes,
    services::{
        backend::{MemoryBackend, ObjectBackend, S3Backend},
        gateway::StorageGateway,
    },
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting bucket-gateway with config: {:?}", cfg);

    // --- Initialize storage backend ---
    let backend: Arc<dyn ObjectBackend> = match cfg.backend {
        BackendKind::S3 => Arc::new(S3Backend::connect(&cfg).await),
        BackendKind::Memory => {
            tracing::warn!(
                "Using in-memory backend for bucket {}; objects are lost on exit",
                cfg.bucket
            );
            Arc::new(MemoryBackend::new(cfg.bucket.clone()))
        }
    };

    // --- Initialize core service ---
    let gateway = StorageGateway::new(backend, cfg.storage_domain())
        .with_deletion_timeout(cfg.deletion_timeout);

    // --- Build router ---
    let app: Router = routes().with_state(gateway);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
