//! API server.

use std::net::SocketAddr;
use std::sync::Arc;

use aether_runtime::AetherRuntime;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::create_router;
use crate::state::AppState;

pub struct ApiServer {
    host: String,
    port: u16,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(host: impl Into<String>, port: u16, runtime: Arc<AetherRuntime>) -> Self {
        Self {
            host: host.into(),
            port,
            state: Arc::new(AppState::new(runtime)),
        }
    }

    /// Host and port from the runtime's `[server]` section.
    pub fn from_runtime(runtime: Arc<AetherRuntime>) -> Self {
        let server = runtime.config().server.clone();
        Self::new(server.host, server.port, runtime)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state.clone());
        let addr: SocketAddr = self.addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("API server listening on {}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_addr_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        config.server.port = 9123;
        let runtime = Arc::new(AetherRuntime::new(config).await.unwrap());

        let server = ApiServer::from_runtime(runtime);
        assert_eq!(server.addr(), "127.0.0.1:9123");
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let runtime = Arc::new(AetherRuntime::new(config).await.unwrap());
        let server = ApiServer::new("127.0.0.1", 0, runtime);

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            server.run(async {}),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }
}
