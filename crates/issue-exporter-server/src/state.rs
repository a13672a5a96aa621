//! Shared state for request handlers.

use std::sync::Arc;
use std::time::Instant;

use issue_exporter::{Reconciler, ReconcilerConfig, TicketTracker, TrackerHealth};

/// State shared by all request handlers.
#[derive(Debug)]
pub struct AppState<T> {
    reconciler: Reconciler<T>,
    health: TrackerHealth,
    started_at: Instant,
}

impl<T: TicketTracker> AppState<T> {
    /// Creates state around a shared tracker client.
    #[must_use]
    pub fn new(tracker: Arc<T>, health: TrackerHealth, config: ReconcilerConfig) -> Self {
        Self {
            reconciler: Reconciler::new(tracker, health.clone(), config),
            health,
            started_at: Instant::now(),
        }
    }

    /// The alert reconciler.
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler<T> {
        &self.reconciler
    }

    /// The tracker health flag written by the connectivity monitor.
    #[must_use]
    pub fn health(&self) -> &TrackerHealth {
        &self.health
    }

    /// Seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
