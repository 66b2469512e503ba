//! Server initialization and startup logic for TubePilot.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tubepilot_api::{AppState, FileLogSink, ServerConfig, serve};
use tubepilot_automation::{AutomationController, MonitorConfig};
use tubepilot_browser::{BrowserConfig, BrowserHandle};

use crate::cli::Cli;

/// The ~/.tubepilot directory.
pub(crate) fn tubepilot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tubepilot"))
        .unwrap_or_else(|| PathBuf::from(".tubepilot"))
}

/// Initialize tracing with console and file output.
///
/// Debug logs are written to ~/.tubepilot/debug/ with daily rotation,
/// keeping 30 days of files.
pub(crate) fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = tubepilot_dir().join("debug");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("tubepilot")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker guard must live for the duration of the program.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable text format with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (text format without colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Run the server in foreground until SIGINT or SIGTERM.
pub(crate) async fn run_server(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting TubePilot v{}", env!("CARGO_PKG_VERSION"));

    let browser_config = BrowserConfig {
        chrome_path: cli.chrome_path,
        debug_port: cli.debug_port,
        headless: !cli.no_headless,
        ..BrowserConfig::default()
    };
    let browser = Arc::new(BrowserHandle::new(browser_config));
    let controller = Arc::new(AutomationController::new(browser, MonitorConfig::default()));

    let log_dir = cli.log_dir.unwrap_or_else(|| tubepilot_dir().join("logs"));
    let log_sink = Arc::new(FileLogSink::new(&log_dir)?);
    info!("Session logs will be written to {}", log_dir.display());

    let state = Arc::new(AppState::new(controller, log_sink));
    let config = ServerConfig::new(cli.host, cli.port);

    serve(config, state, shutdown_signal()).await
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
