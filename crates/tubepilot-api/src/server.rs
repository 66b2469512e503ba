//! HTTP server startup and shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::logsink::spawn_retention_task;
use crate::routes::build_router;
use crate::state::AppState;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The address the server binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Serve the API until the shutdown future resolves, then wind down the
/// retention task and close the browser.
pub async fn serve(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let retention = spawn_retention_task(Arc::clone(&state.log_sink), stop_rx);

    let app = build_router(Arc::clone(&state));
    let addr: SocketAddr = config.addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("TubePilot server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    let _ = stop_tx.send(true);
    let _ = retention.await;
    state.controller.cleanup().await;
    info!("Server stopped");

    Ok(())
}
