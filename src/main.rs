//! TubePilot - Headless-browser video playback automation service.
//!
//! Main entry point for the TubePilot server.

mod cli;
mod server;

use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing()?;

    let cli = cli::Cli::parse();
    server::run_server(cli).await
}
