//! Webhook server lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use issue_exporter::{ConnectivityMonitor, MonitorHandle, TicketTracker, TrackerHealth};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::state::AppState;

/// The webhook server plus its connectivity monitor.
#[derive(Debug)]
pub struct ExporterServer<T> {
    state: Arc<AppState<T>>,
    tracker: Arc<T>,
    probe_interval: Duration,
}

impl<T: TicketTracker> ExporterServer<T> {
    /// Create a server that files alerts through `tracker`.
    #[must_use]
    pub fn new(config: ServerConfig, tracker: T) -> Self {
        Self::with_shared_tracker(config, Arc::new(tracker))
    }

    /// Create a server around an already shared tracker.
    #[must_use]
    pub fn with_shared_tracker(config: ServerConfig, tracker: Arc<T>) -> Self {
        let state = Arc::new(AppState::new(
            Arc::clone(&tracker),
            TrackerHealth::new(),
            config.reconciler,
        ));
        Self {
            state,
            tracker,
            probe_interval: config.probe_interval,
        }
    }

    /// Get the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState<T>> {
        Arc::clone(&self.state)
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Start the connectivity monitor on the current runtime.
    pub fn spawn_monitor(&self, cancel: CancellationToken) -> MonitorHandle {
        ConnectivityMonitor::new(Arc::clone(&self.tracker), self.state.health().clone())
            .with_interval(self.probe_interval)
            .spawn(cancel)
    }

    /// Start the server and listen for alerts until a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> ServerResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The monitor runs for as long as the server does and is stopped once
    /// in-flight requests have drained.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;
        let local_addr = listener.local_addr().unwrap_or(addr);
        info!(addr = %local_addr, "issue exporter listening");

        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let monitor = self.spawn_monitor(CancellationToken::new());

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        monitor.shutdown().await;
        info!("issue exporter shut down");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issue_exporter::FakeTracker;

    #[tokio::test]
    async fn test_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let server = ExporterServer::new(ServerConfig::new(addr), FakeTracker::default());

        let err = server
            .serve_with_shutdown(addr, async {})
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::BindFailed(a, _) if a == addr));
    }

    #[tokio::test]
    async fn test_monitor_probes_while_serving() {
        let tracker = Arc::new(FakeTracker::default());
        tracker.set_reachable(false);
        let config = ServerConfig::default().with_probe_interval(Duration::from_secs(3600));
        let server = ExporterServer::with_shared_tracker(config, Arc::clone(&tracker));
        let state = server.state();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let serving = tokio::spawn(async move {
            server
                .serve_listener(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        for _ in 0..50 {
            if tracker.head_calls() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(tracker.head_calls(), 1);
        assert!(!state.health().is_healthy());

        tx.send(()).unwrap();
        serving.await.unwrap().unwrap();
    }
}
