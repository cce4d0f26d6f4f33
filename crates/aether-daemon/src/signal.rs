//! OS signals to a shutdown broadcast.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::DaemonError;

/// Fans a single shutdown request out to every runner and the heartbeat.
#[derive(Clone)]
pub struct SignalHandler {
    sender: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Request shutdown. Repeated requests are broadcast again.
    pub fn request_shutdown(&self) {
        debug!("Shutdown requested");
        self.shutdown_requested.store(true, Ordering::SeqCst);
        // No receivers is fine; the flag still records the request.
        let _ = self.sender.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_requested() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Install SIGTERM and SIGINT handlers.
    #[cfg(unix)]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        use tokio::signal::unix::{SignalKind, signal};

        for (kind, name) in [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::interrupt(), "SIGINT"),
        ] {
            let mut stream = signal(kind).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
            let handler = self.clone();
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    info!(signal = name, "Received signal");
                    handler.request_shutdown();
                }
            });
        }

        info!("OS signal handlers installed (SIGTERM, SIGINT)");
        Ok(())
    }

    /// Ctrl+C only on non-Unix platforms.
    #[cfg(not(unix))]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        let handler = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C");
                handler.request_shutdown();
            }
        });
        Ok(())
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initial_state() {
        let handler = SignalHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_request_shutdown_broadcasts() {
        let handler = SignalHandler::new();
        let mut rx1 = handler.subscribe();
        let mut rx2 = handler.subscribe();

        handler.request_shutdown();

        assert!(handler.is_shutdown_requested());
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_request_without_receivers() {
        let handler = SignalHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_after_request() {
        let handler = SignalHandler::new();
        handler.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), handler.wait_for_shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_from_clone() {
        let handler = SignalHandler::new();
        let remote = handler.clone();
        let waiter = tokio::spawn(async move { handler.wait_for_shutdown().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        remote.request_shutdown();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_setup_os_signals() {
        let handler = SignalHandler::new();
        assert!(handler.setup_os_signals().is_ok());
    }
}
