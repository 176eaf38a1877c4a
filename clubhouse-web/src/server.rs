//! Clubhouse Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState};
use axum::serve;
use clubhouse_core::{ClubConfig, ClubError, ClubResult};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub struct ClubServer {
    config: ClubConfig,
    state: AppState,
}

impl ClubServer {
    /// Resolve roles and capabilities, open storage. Any configuration
    /// inconsistency fails here, before a socket is bound.
    pub async fn new(config: ClubConfig) -> ClubResult<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> ClubResult<()> {
        let address = self.config.server.address();

        info!("Starting Clubhouse server");
        info!("Server address: http://{}", address);
        if self.config.server.dev_mode {
            warn!("Development mode: CORS accepts any origin");
        }

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address).await.map_err(ClubError::Io)?;
        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            error!("Server error: {}", e);
            return Err(ClubError::Io(e));
        }

        info!("Server shut down");
        Ok(())
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Builder for ClubServer
pub struct ClubServerBuilder {
    config: ClubConfig,
}

impl ClubServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ClubConfig::default(),
        }
    }

    /// Start from a loaded configuration
    pub fn config(mut self, config: ClubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.storage.database_url = Some(database_url.into());
        self
    }

    pub async fn build(self) -> ClubResult<ClubServer> {
        ClubServer::new(self.config).await
    }
}

impl Default for ClubServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
