use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::utils::logging::log_startup;

/// Application: shared state plus the bound listener
pub struct App {
    state: Arc<AppState>,
    listener: TcpListener,
}

impl App {
    /// Bind the listen address and build the shared state
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.bind_addr, &config.upstream_base_url);

        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .with_context(|| format!("cannot create output dir {}", config.output_dir))?;

        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("cannot bind {}", config.bind_addr))?;

        Ok(Self {
            state: Arc::new(AppState::new(config)),
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> Result<()> {
        let app = api::router(self.state);
        info!("✓ ready on {}", self.listener.local_addr()?);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
