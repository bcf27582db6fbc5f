use std::process::ExitCode;

use chart_server::{
    config::{Cli, ServerConfig},
    logging,
};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(logging::level(cli.verbose, cli.quiet));

    match chart_server::run(ServerConfig::from(cli)).await {
        Ok(()) => {
            tracing::info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Server error");
            ExitCode::FAILURE
        }
    }
}
