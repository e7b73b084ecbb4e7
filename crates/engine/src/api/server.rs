use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::routes::create_router;
use crate::mcp::McpServer;

pub async fn start_server(
    mcp: Arc<McpServer>,
    addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let name = mcp.server().name();
    let app = create_router(mcp);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("{} listening on http://{}/mcp", name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutting down HTTP server...");
}
