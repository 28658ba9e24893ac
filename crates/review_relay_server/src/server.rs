//! HTTP server configuration and startup.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;

use crate::{routes, AppState};

/// The ingress HTTP server.
pub struct IngressServer {
    host: String,
    port: u16,
    state: AppState,
}

impl IngressServer {
    /// Create a server bound to the configured host and port.
    pub fn new(host: impl Into<String>, port: u16, state: AppState) -> Self {
        Self {
            host: host.into(),
            port,
            state,
        }
    }

    /// Build the router (exposed for tests).
    pub fn router(&self) -> axum::Router {
        routes::create_router(self.state.clone())
    }

    /// Start the server and listen for requests.
    ///
    /// Blocks until the server is shut down gracefully via CTRL+C
    /// (SIGINT) or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured
    /// address.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from((self.host.parse::<std::net::IpAddr>()?, self.port));

        tracing::info!("Starting ingress server on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        let app = self.router();

        // Connect info is needed so the rate limiter can key on the peer
        // address when no forwarding header is present.
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Wait for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
