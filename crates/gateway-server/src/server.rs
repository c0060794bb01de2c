//! HTTP server lifecycle.

use crate::{routes::create_router, shutdown::shutdown_signal, state::AppState};
use gateway_config::ServerSettings;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Server bind settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Create with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Socket address string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// Server error
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listener
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address that failed
        address: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The server loop failed
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// The gateway HTTP server
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until a shutdown signal arrives, then drain in-flight requests
    ///
    /// # Errors
    /// Returns error if the listener cannot be bound or serving fails
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        info!(address = %address, "Gateway listening");

        let app = create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
            })
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}
