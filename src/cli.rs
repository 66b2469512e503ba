//! CLI definitions for TubePilot.

use std::path::PathBuf;

use clap::Parser;

/// TubePilot CLI.
#[derive(Parser)]
#[command(name = "tubepilot")]
#[command(about = "Headless-browser video playback automation service")]
#[command(version)]
pub(crate) struct Cli {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Session log directory (default: ~/.tubepilot/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Chrome executable path (default: auto-detect)
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Chrome remote debugging port
    #[arg(long, default_value_t = 9222)]
    pub debug_port: u16,

    /// Run Chrome with a visible window
    #[arg(long)]
    pub no_headless: bool,
}
