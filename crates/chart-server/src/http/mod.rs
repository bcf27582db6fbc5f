//! Streamable HTTP transport: `POST/GET/DELETE /mcp` backed by a
//! [`session::SessionRegistry`], plus `/health`.

pub mod routes;
pub mod session;

use std::sync::Arc;

use anyhow::Context;
use mcp_chart_rs::ChartRenderer;

use crate::config::ServerConfig;
pub use routes::{SESSION_HEADER, router};
pub use session::{SessionId, SessionRegistry};

pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let renderer = Arc::new(ChartRenderer::new(config.output_dir.clone()));
    let registry = SessionRegistry::new(renderer);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("MCP Streamable HTTP Server started on {}", listener.local_addr()?);

    axum::serve(listener, router(registry.clone()))
        .with_graceful_shutdown(shutdown_signal(registry.clone()))
        .await?;

    // In-flight requests have drained by now; catch anything they opened.
    let late = registry.close_all().await;
    if late > 0 {
        tracing::info!(closed = late, "Closed sessions opened during shutdown");
    }

    Ok(())
}

/// Resolves on ctrl-c after every session has been closed. The registry
/// refuses new sessions from then on.
async fn shutdown_signal(registry: SessionRegistry) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl_c: {:?}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down MCP server...");
    let closed = registry.close_all().await;
    tracing::info!(closed, "Closed sessions");
}
