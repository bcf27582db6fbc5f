use std::sync::Arc;

use mcp_chart_rs::{ChartRenderer, ChartRouter};
use mcp_server_rs::{router::service::RouterService, server::Server, transport::ByteTransport};

use crate::config::ServerConfig;

/// Serves a single client on stdin/stdout until stdin closes.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let router = ChartRouter::new(Arc::new(ChartRenderer::new(config.output_dir.clone())));
    let transport = ByteTransport::new(tokio::io::stdin(), tokio::io::stdout());

    tracing::info!("Serving MCP over stdio");
    Server::new(RouterService::new(router)).run(transport).await?;
    Ok(())
}
