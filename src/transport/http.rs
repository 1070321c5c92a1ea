//! HTTP transport for the Dry Beans API.
//!
//! Binds the listener, serves the router and drains in-flight requests on
//! shutdown before closing the database pool.

use crate::error::{BeanError, BeanResult};
use crate::routes::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Time allowed for in-flight requests once shutdown starts.
pub const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport serving the bean routes.
pub struct HttpTransport {
    state: Arc<AppState>,
    /// Directory served for unmatched paths
    static_dir: Option<PathBuf>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `state` - Shared application state holding the bean store
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    pub fn new(state: Arc<AppState>, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            static_dir: None,
            host: host.into(),
            port,
        }
    }

    /// Serve files from `dir` for paths the API does not handle.
    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Run until a shutdown signal arrives, then close the pool.
    pub async fn run(&self) -> BeanResult<()> {
        let bind_addr = self.bind_addr();
        let app = routes::router(self.state.clone(), self.static_dir.as_deref());

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            BeanError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;

        info!(
            addr = %bind_addr,
            static_dir = ?self.static_dir,
            "Dry Beans API listening"
        );

        // Use a notify to coordinate shutdown timing
        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // Race between: server draining normally vs forced timeout/second signal after shutdown
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        self.state.store.close().await;
                        return Err(BeanError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for in-flight requests (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database connections");
        self.state.store.close().await;

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::db::{BeanStore, DbPool};
    use crate::models::ConnectionTarget;

    async fn transport(host: &str, port: u16) -> (HttpTransport, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("http.db").display());
        let target = ConnectionTarget::from_url(&url).unwrap();
        let pool = DbPool::connect(&target, &PoolOptions::default())
            .await
            .unwrap();
        let state = AppState::new(BeanStore::new(pool, Duration::from_secs(5)));
        (HttpTransport::new(state, host, port), dir)
    }

    #[tokio::test]
    async fn test_http_transport_bind_addr() {
        let (transport, _dir) = transport("127.0.0.1", 8080).await;
        assert_eq!(transport.bind_addr(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_http_transport_static_dir() {
        let (transport, dir) = transport("0.0.0.0", 3000).await;
        let transport = transport.with_static_dir(Some(dir.path().to_path_buf()));
        assert_eq!(transport.static_dir.as_deref(), Some(dir.path()));
    }
}
