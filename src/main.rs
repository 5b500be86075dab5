use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, Backend};
use services::{
    gateway_service::GatewayService, memory_store::MemoryStore, object_store::ObjectStore,
    oss_store::OssStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting oss-gateway with config: {:?}", cfg);

    // --- Initialize the store client once, shared by all handlers ---
    let store: Arc<dyn ObjectStore> = match (cfg.backend, cfg.oss.as_ref()) {
        (Backend::Oss, Some(oss)) => {
            tracing::info!("OSS settings loaded from {}", cfg.env_file.display());
            Arc::new(OssStore::new(oss))
        }
        (Backend::Oss, None) => anyhow::bail!("oss backend selected without OSS settings"),
        (Backend::Memory, _) => {
            tracing::warn!("Using the in-memory backend; objects are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    let service = GatewayService::new(store);

    // --- Build router ---
    let app: Router = routes::routes::routes(cfg.max_upload_bytes).with_state(service);

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
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
