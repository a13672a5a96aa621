//! Alert-to-ticket reconciliation for issue trackers.
//!
//! This crate turns Alertmanager-style firing alerts into deduplicated,
//! throttled tickets:
//!
//! - **Reconciler**: finds or creates the ticket for an alert and appends
//!   rate-limited "still firing" notes up to a cap
//! - **Connectivity monitor**: probes the tracker periodically and gates the
//!   reconciler on the result
//! - **Tracker seam**: [`TicketTracker`], implemented for GitLab and in memory
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use issue_exporter::{Alert, FakeTracker, Reconciler, ReconcilerConfig, TrackerHealth};
//!
//! # async fn example() {
//! let tracker = Arc::new(FakeTracker::default());
//! let reconciler = Reconciler::new(tracker, TrackerHealth::new(), ReconcilerConfig::default());
//!
//! let outcome = reconciler.reconcile(&Alert::firing("Disk full", "/var at 99%")).await;
//! println!("{}", outcome.as_str());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dedup;
pub mod error;
pub mod fake;
pub mod gitlab;
pub mod locks;
pub mod monitor;
pub mod payload;
pub mod reconciler;
pub mod throttle;
pub mod tracker;
pub mod types;

pub use dedup::DedupStrategy;
pub use error::{PayloadError, Result, TrackerError};
pub use fake::FakeTracker;
pub use gitlab::{GitLabConfig, GitLabTracker};
pub use monitor::{ConnectivityMonitor, MonitorHandle, TrackerHealth};
pub use payload::parse_alert;
pub use reconciler::{ReconcileOutcome, ReconcileStage, Reconciler, ReconcilerConfig};
pub use throttle::{NoteDecision, NotePolicy};
pub use tracker::TicketTracker;
pub use types::{Alert, AlertStatus, Note, Ticket, TicketState};
