//! Connectivity monitor for the tracker backend.
//!
//! A single background task probes the tracker on a fixed interval and
//! publishes the result through [`TrackerHealth`], which request handlers
//! read before touching the tracker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, instrument};

use crate::tracker::TicketTracker;

/// Default time between two probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest accepted time between two probes.
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct HealthInner {
    healthy: AtomicBool,
    last_checked: RwLock<Option<DateTime<Utc>>>,
}

/// Shared tracker health flag.
///
/// Written only by the monitor; cheap to clone and read from any task.
/// Starts out healthy so alerts arriving before the first probe are processed.
#[derive(Debug, Clone)]
pub struct TrackerHealth {
    inner: Arc<HealthInner>,
}

impl Default for TrackerHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerHealth {
    /// Creates a flag in the healthy state with no probe recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HealthInner {
                healthy: AtomicBool::new(true),
                last_checked: RwLock::new(None),
            }),
        }
    }

    /// Returns the result of the most recent probe.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.inner.healthy.load(Ordering::Acquire)
    }

    /// When the most recent probe finished.
    #[must_use]
    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_checked.read()
    }

    /// Records a probe result and returns the previous health value.
    pub fn record(&self, healthy: bool, at: DateTime<Utc>) -> bool {
        *self.inner.last_checked.write() = Some(at);
        self.inner.healthy.swap(healthy, Ordering::AcqRel)
    }
}

/// Periodically checks that the tracker is reachable.
#[derive(Debug)]
pub struct ConnectivityMonitor<T> {
    tracker: Arc<T>,
    health: TrackerHealth,
    interval: Duration,
}

impl<T: TicketTracker> ConnectivityMonitor<T> {
    /// Creates a monitor that writes into `health`.
    #[must_use]
    pub fn new(tracker: Arc<T>, health: TrackerHealth) -> Self {
        Self {
            tracker,
            health,
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Sets the probe interval, raised to at least [`MIN_PROBE_INTERVAL`].
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_PROBE_INTERVAL);
        self
    }

    /// The health flag this monitor writes.
    #[must_use]
    pub fn health(&self) -> &TrackerHealth {
        &self.health
    }

    /// The probe interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one reachability check and updates the health flag.
    ///
    /// Failures are logged, never returned; the next scheduled probe is the
    /// retry.
    #[instrument(name = "probe", skip_all)]
    pub async fn probe(&self) -> bool {
        debug!("checking connection to tracker");
        let result = self.tracker.head_check().await;
        let healthy = result.is_ok();
        let was_healthy = self.health.record(healthy, Utc::now());

        match result {
            Ok(()) if !was_healthy => info!("connection to tracker restored"),
            Ok(()) => debug!("connection to tracker is working"),
            Err(e) if e.is_transport() => error!(error = %e, "tracker is unreachable"),
            Err(e) => error!(error = %e, "tracker answered the health check with an error"),
        }

        healthy
    }

    /// Spawns the probe loop on the current runtime.
    ///
    /// The first probe runs immediately. The loop ends when `cancel` fires or
    /// [`MonitorHandle::stop`] is called.
    pub fn spawn(self, cancel: CancellationToken) -> MonitorHandle {
        let token = cancel.clone();
        let span = info_span!("connectivity_monitor", interval_secs = self.interval.as_secs());

        let task = tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(self.interval.max(MIN_PROBE_INTERVAL));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        () = token.cancelled() => break,
                        _ = ticker.tick() => {
                            self.probe().await;
                        }
                    }
                }

                debug!("connectivity monitor stopped");
            }
            .instrument(span),
        );

        MonitorHandle { cancel, task }
    }
}

/// Handle for the spawned monitor task.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Asks the monitor loop to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "connectivity monitor task failed");
        }
    }
}
