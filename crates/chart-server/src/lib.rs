//! Process wiring for the chart MCP server: configuration, logging and the
//! two transports.

pub mod config;
pub mod http;
pub mod logging;
pub mod stdio;

use config::{ServerConfig, Transport};

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.transport,
        output_dir = %config.output_dir.display(),
        "Starting chart-mcp"
    );

    match config.transport {
        Transport::Stdio => stdio::serve(&config).await,
        Transport::StreamableHttp => http::serve(&config).await,
    }
}
