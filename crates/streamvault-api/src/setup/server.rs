//! HTTP server startup.

use axum::Router;
use std::net::SocketAddr;
use streamvault_core::Config;

pub async fn start_server(config: &Config, router: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
