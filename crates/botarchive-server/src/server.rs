use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Bot Archive HTTP server.
pub struct BotArchiveServer {
    config: ServerConfig,
    state: AppState,
}

impl BotArchiveServer {
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "bot archive listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction_defaults_to_memory() {
        let server = BotArchiveServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr.port(), 3000);
        let _router = server.router();
    }

    #[test]
    fn file_store_is_opened_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: Some(dir.path().join("data")),
            ..ServerConfig::default()
        };
        assert!(BotArchiveServer::new(config).is_ok());
    }

    #[test]
    fn bad_digest_refuses_to_start() {
        let config = ServerConfig {
            admin_password_sha256: "zz".into(),
            ..ServerConfig::default()
        };
        assert!(BotArchiveServer::new(config).is_err());
    }
}
