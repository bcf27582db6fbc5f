use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// `POST/GET/DELETE /mcp` with per-client sessions
    #[value(name = "streamable-http")]
    StreamableHttp,
}

/// MCP server that renders charts from Chart.js style configurations.
#[derive(Parser, Debug)]
#[command(name = "chart-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Transport to serve MCP over
    #[arg(long, value_enum, env = "MCP_TRANSPORT", default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Port for the streamable HTTP transport
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind the streamable HTTP transport to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Directory that receives saved PNG files [default: <tmp>/mcp-charts]
    #[arg(long, env = "CHART_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub output_dir: PathBuf,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("mcp-charts")
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            transport: cli.transport,
            host: cli.host,
            port: cli.port,
            output_dir: cli.output_dir.unwrap_or_else(default_output_dir),
        }
    }
}
