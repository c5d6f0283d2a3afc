use std::future::Future;
use std::sync::Arc;

use qrdrop_store::{DiskImageStore, ImageStore, InMemoryImageStore, Reaper};
use qrdrop_types::{Clock, SystemClock};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// QR Drop HTTP server.
pub struct QrDropServer {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl QrDropServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the configured backend: on disk if `upload_dir` is set, else in memory.
    pub fn open_store(&self) -> ServerResult<Arc<dyn ImageStore>> {
        let store_config = self.config.store_config()?;
        let clock = Arc::clone(&self.clock);
        let store: Arc<dyn ImageStore> = match &self.config.upload_dir {
            Some(dir) => Arc::new(DiskImageStore::open_with_clock(dir, store_config, clock)?),
            None => Arc::new(InMemoryImageStore::with_clock(store_config, clock)?),
        };
        Ok(store)
    }

    /// Build the router around `store` (useful for testing).
    pub fn router(&self, store: Arc<dyn ImageStore>) -> axum::Router {
        build_router(AppState::with_clock(
            self.config.clone(),
            store,
            Arc::clone(&self.clock),
        ))
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `signal` resolves, then stop the reaper.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;
        let store = self.open_store()?;
        let reaper = Reaper::spawn(
            Arc::clone(&store),
            Arc::clone(&self.clock),
            self.config.reaper_config(),
        )?;

        let app = self.router(store);
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(
            addr = %listener.local_addr()?,
            backend = if self.config.upload_dir.is_some() { "disk" } else { "memory" },
            expiration_hours = self.config.expiration_hours,
            "QR Drop server listening"
        );

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await;
        reaper.shutdown().await;
        info!("server shutdown complete");
        Ok(served?)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
