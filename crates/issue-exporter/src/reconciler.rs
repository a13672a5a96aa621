//! Alert-to-ticket reconciliation.
//!
//! For every firing alert the reconciler finds the open ticket for the
//! alert's dedup key and either opens a new one or appends a throttled
//! note. All persistent state lives in the tracker; nothing is cached here.
//!
//! ```text
//! RECEIVED --(not firing)-----------> Dropped
//! RECEIVED --(firing, unhealthy)----> Rejected
//! RECEIVED --(firing, healthy)------> search
//! search   --(no open ticket)-------> create
//! search   --(open ticket)----------> fetch notes -> NotePolicy
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use crate::dedup::DedupStrategy;
use crate::locks::KeyLocks;
use crate::monitor::TrackerHealth;
use crate::throttle::{AuthoredNotes, NoteDecision, NotePolicy, final_note_body, still_firing_body};
use crate::tracker::{TicketTracker, earliest_open};
use crate::types::{Alert, AlertStatus};

/// Default identity whose notes count toward the cap.
pub const DEFAULT_BOT_USERNAME: &str = "gitlab-issue-exporter";

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Username the tracker client is authenticated as.
    pub bot_username: String,
    /// Note cap and grace period.
    pub policy: NotePolicy,
    /// How dedup keys are derived.
    pub dedup: DedupStrategy,
    /// Serialize handling of alerts that share a dedup key.
    pub serialize_per_key: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            bot_username: DEFAULT_BOT_USERNAME.to_string(),
            policy: NotePolicy::default(),
            dedup: DedupStrategy::default(),
            serialize_per_key: true,
        }
    }
}

impl ReconcilerConfig {
    /// Creates a config for the given bot identity with default policy.
    #[must_use]
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
            ..Self::default()
        }
    }

    /// Sets the note policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: NotePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the dedup strategy.
    #[must_use]
    pub fn with_dedup(mut self, dedup: DedupStrategy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Enables or disables the per-key lock.
    #[must_use]
    pub const fn with_key_lock(mut self, enabled: bool) -> Self {
        self.serialize_per_key = enabled;
        self
    }
}

/// Tracker call that failed while handling an existing ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    /// Searching for an open ticket.
    Search,
    /// Fetching the matched ticket and its notes.
    Fetch,
    /// Appending a note.
    Note,
}

impl ReconcileStage {
    /// Returns the stage as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Fetch => "fetch",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one alert.
///
/// Every variant maps to an HTTP 200 at the webhook; the outcome exists for
/// logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The alert was not firing.
    Dropped {
        /// The alert's status.
        status: AlertStatus,
    },
    /// The tracker was marked unhealthy; nothing was attempted.
    Rejected,
    /// A new ticket was opened.
    Created {
        /// The new ticket.
        ticket_id: u64,
    },
    /// Opening a new ticket failed.
    CreateFailed {
        /// The tracker error.
        error: String,
    },
    /// A "still firing" note was appended.
    NoteAppended {
        /// The matched ticket.
        ticket_id: u64,
        /// Authored notes on the ticket, including the new one.
        authored_notes: usize,
    },
    /// The final note was appended.
    FinalNoteAppended {
        /// The matched ticket.
        ticket_id: u64,
    },
    /// The grace period has not elapsed.
    Suppressed {
        /// The matched ticket.
        ticket_id: u64,
        /// Time since the last authored note.
        elapsed: Duration,
        /// Time left in the grace period.
        remaining: Duration,
    },
    /// The ticket already has its final note.
    Exhausted {
        /// The matched ticket.
        ticket_id: u64,
    },
    /// A tracker call failed.
    Failed {
        /// Which call failed.
        stage: ReconcileStage,
        /// The tracker error.
        error: String,
    },
}

impl ReconcileOutcome {
    /// Short name for log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dropped { .. } => "dropped",
            Self::Rejected => "rejected",
            Self::Created { .. } => "created",
            Self::CreateFailed { .. } => "create_failed",
            Self::NoteAppended { .. } => "note_appended",
            Self::FinalNoteAppended { .. } => "final_note_appended",
            Self::Suppressed { .. } => "suppressed",
            Self::Exhausted { .. } => "exhausted",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns true if the tracker was written to.
    #[must_use]
    pub const fn wrote(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::NoteAppended { .. } | Self::FinalNoteAppended { .. }
        )
    }
}

/// Turns firing alerts into tickets and notes.
#[derive(Debug)]
pub struct Reconciler<T> {
    tracker: Arc<T>,
    health: TrackerHealth,
    config: ReconcilerConfig,
    locks: KeyLocks,
}

impl<T: TicketTracker> Reconciler<T> {
    /// Creates a reconciler that consults `health` before every tracker call.
    #[must_use]
    pub fn new(tracker: Arc<T>, health: TrackerHealth, config: ReconcilerConfig) -> Self {
        Self {
            tracker,
            health,
            config,
            locks: KeyLocks::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// The tracker this reconciler writes to.
    #[must_use]
    pub fn tracker(&self) -> &Arc<T> {
        &self.tracker
    }

    /// Number of dedup keys currently being processed.
    #[must_use]
    pub fn keys_in_flight(&self) -> usize {
        self.locks.len()
    }

    /// Handles one alert. Never fails; problems are logged and reported in
    /// the outcome.
    pub async fn reconcile(&self, alert: &Alert) -> ReconcileOutcome {
        let span = info_span!(
            "reconcile",
            status = %alert.status,
            title = %alert.title,
            key = field::Empty,
        );

        async {
            let outcome = self.run(alert).await;
            debug!(outcome = outcome.as_str(), "alert handled");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, alert: &Alert) -> ReconcileOutcome {
        if !alert.is_firing() {
            debug!("ignoring alert that is not firing");
            return ReconcileOutcome::Dropped {
                status: alert.status,
            };
        }

        if !self.health.is_healthy() {
            error!(
                description = %alert.description,
                "tracker is unavailable, alert not recorded"
            );
            return ReconcileOutcome::Rejected;
        }

        // Keyed only once the alert is going to reach the tracker.
        let key = self.config.dedup.key_for(alert);
        Span::current().record("key", key.as_str());
        let key = key.as_str();

        let _guard = if self.config.serialize_per_key {
            Some(self.locks.lock(key).await)
        } else {
            None
        };

        let found = match self.tracker.search_open_tickets(key).await {
            Ok(tickets) => earliest_open(tickets),
            Err(e) => {
                error!(error = %e, "failed to search for existing ticket");
                return ReconcileOutcome::Failed {
                    stage: ReconcileStage::Search,
                    error: e.to_string(),
                };
            }
        };

        match found {
            Some(ticket) => self.update(ticket.id).await,
            None => self.create(alert, key).await,
        }
    }

    async fn create(&self, alert: &Alert, key: &str) -> ReconcileOutcome {
        debug!("no open ticket found, creating one");
        match self.tracker.create_ticket(key, &alert.description).await {
            Ok(ticket) => {
                info!(
                    ticket_id = ticket.id,
                    web_url = ticket.web_url.as_deref().unwrap_or_default(),
                    "created ticket"
                );
                ReconcileOutcome::Created {
                    ticket_id: ticket.id,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    description = %alert.description,
                    "failed to create ticket"
                );
                ReconcileOutcome::CreateFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn update(&self, ticket_id: u64) -> ReconcileOutcome {
        let ticket = match self.tracker.get_ticket(ticket_id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                error!(ticket_id, error = %e, "failed to fetch ticket");
                return ReconcileOutcome::Failed {
                    stage: ReconcileStage::Fetch,
                    error: e.to_string(),
                };
            }
        };

        let authored = AuthoredNotes::collect(&ticket, &self.config.bot_username);
        let now = Utc::now();
        debug!(
            ticket_id,
            authored_notes = authored.count,
            total_notes = ticket.notes.len(),
            "found open ticket"
        );

        match self.config.policy.decide(&authored, now) {
            NoteDecision::Append => {
                if let Err(outcome) = self.append(ticket_id, &still_firing_body(now)).await {
                    return outcome;
                }
                info!(ticket_id, authored_notes = authored.count + 1, "added note to ticket");
                ReconcileOutcome::NoteAppended {
                    ticket_id,
                    authored_notes: authored.count + 1,
                }
            }
            NoteDecision::AppendFinal => {
                if let Err(outcome) = self.append(ticket_id, &final_note_body(now)).await {
                    return outcome;
                }
                warn!(ticket_id, "maximum number of notes reached, ticket will no longer be updated");
                ReconcileOutcome::FinalNoteAppended { ticket_id }
            }
            NoteDecision::Suppress { elapsed, remaining } => {
                debug!(
                    ticket_id,
                    elapsed_secs = elapsed.as_secs(),
                    remaining_secs = remaining.as_secs(),
                    "grace period not over, skipping note"
                );
                ReconcileOutcome::Suppressed {
                    ticket_id,
                    elapsed,
                    remaining,
                }
            }
            NoteDecision::Exhausted => {
                debug!(ticket_id, "ticket has its final note, skipping");
                ReconcileOutcome::Exhausted { ticket_id }
            }
        }
    }

    async fn append(&self, ticket_id: u64, body: &str) -> Result<(), ReconcileOutcome> {
        self.tracker
            .create_note(ticket_id, body)
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(ticket_id, error = %e, "failed to add note to ticket");
                ReconcileOutcome::Failed {
                    stage: ReconcileStage::Note,
                    error: e.to_string(),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTracker;
    use crate::throttle::FINAL_NOTE_MARKER;
    use crate::types::TicketState;
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const BOT: &str = "bot";

    fn reconciler(tracker: &Arc<FakeTracker>, grace_secs: u64) -> Reconciler<FakeTracker> {
        let config = ReconcilerConfig::new(BOT)
            .with_policy(NotePolicy::new(10, Duration::from_secs(grace_secs)));
        Reconciler::new(Arc::clone(tracker), TrackerHealth::new(), config)
    }

    fn seed_notes(tracker: &FakeTracker, id: u64, count: usize, last_age_secs: i64) {
        let now = Utc::now();
        for i in 0..count {
            let age = last_age_secs + i64::try_from(count - 1 - i).unwrap() * 60;
            tracker.insert_note(id, BOT, now - TimeDelta::seconds(age), "`ts`: Issue not yet resolved");
        }
    }

    fn authored(tracker: &FakeTracker, id: u64) -> usize {
        tracker.ticket(id).unwrap().notes_by(BOT).count()
    }

    #[tokio::test]
    async fn test_resolved_alert_is_dropped() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::resolved("Disk full", ""))
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::Dropped {
                status: AlertStatus::Resolved
            }
        );
        assert_eq!(tracker.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_tracker_rejects_without_calls() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let reconciler = reconciler(&tracker, 10);
        reconciler.health.record(false, Utc::now());

        let outcome = reconciler.reconcile(&Alert::firing("Disk full", "")).await;

        assert_eq!(outcome, ReconcileOutcome::Rejected);
        assert_eq!(tracker.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_match_creates_ticket() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", "/var at 99%"))
            .await;

        let ReconcileOutcome::Created { ticket_id } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        let ticket = tracker.ticket(ticket_id).unwrap();
        assert_eq!(ticket.title, "Disk full");
        assert_eq!(ticket.description, "/var at 99%");
        assert_eq!(tracker.create_ticket_calls(), 1);
        assert_eq!(tracker.create_note_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_alert_matches_created_ticket() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let reconciler = reconciler(&tracker, 600);
        let alert = Alert::firing("Disk full", "");

        let first = reconciler.reconcile(&alert).await;
        let second = reconciler.reconcile(&alert).await;
        let third = reconciler.reconcile(&alert).await;

        let ReconcileOutcome::Created { ticket_id } = first else {
            panic!("expected Created, got {first:?}");
        };
        assert_eq!(
            second,
            ReconcileOutcome::NoteAppended {
                ticket_id,
                authored_notes: 1
            }
        );
        assert!(matches!(third, ReconcileOutcome::Suppressed { ticket_id: id, .. } if id == ticket_id));
        assert_eq!(tracker.count_titled("Disk full"), 1);
    }

    #[tokio::test]
    async fn test_recent_note_suppresses() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let id = tracker.insert_ticket("Disk full", TicketState::Opened);
        seed_notes(&tracker, id, 3, 2);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        let ReconcileOutcome::Suppressed { elapsed, remaining, .. } = outcome else {
            panic!("expected Suppressed, got {outcome:?}");
        };
        assert!(elapsed >= Duration::from_secs(2));
        assert!(remaining <= Duration::from_secs(8));
        assert_eq!(tracker.create_note_calls(), 0);
        assert_eq!(authored(&tracker, id), 3);
    }

    #[tokio::test]
    async fn test_ninth_note_reaches_cap() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let id = tracker.insert_ticket("Disk full", TicketState::Opened);
        seed_notes(&tracker, id, 9, 30);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::NoteAppended {
                ticket_id: id,
                authored_notes: 10
            }
        );
        assert_eq!(authored(&tracker, id), 10);
    }

    #[tokio::test]
    async fn test_final_note_written_once() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let id = tracker.insert_ticket("Disk full", TicketState::Opened);
        seed_notes(&tracker, id, 10, 0);
        let reconciler = reconciler(&tracker, 600);
        let alert = Alert::firing("Disk full", "");

        assert_eq!(
            reconciler.reconcile(&alert).await,
            ReconcileOutcome::FinalNoteAppended { ticket_id: id }
        );
        assert_eq!(
            reconciler.reconcile(&alert).await,
            ReconcileOutcome::Exhausted { ticket_id: id }
        );

        let ticket = tracker.ticket(id).unwrap();
        assert_eq!(ticket.notes_by(BOT).count(), 11);
        let finals = ticket
            .notes
            .iter()
            .filter(|n| n.body.contains(FINAL_NOTE_MARKER))
            .count();
        assert_eq!(finals, 1);
    }

    #[tokio::test]
    async fn test_past_cap_does_nothing() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let id = tracker.insert_ticket("Disk full", TicketState::Opened);
        seed_notes(&tracker, id, 11, 3600);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert_eq!(outcome, ReconcileOutcome::Exhausted { ticket_id: id });
        assert_eq!(tracker.create_note_calls(), 0);
    }

    #[tokio::test]
    async fn test_human_notes_are_ignored() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let id = tracker.insert_ticket("Disk full", TicketState::Opened);
        let now = Utc::now();
        for _ in 0..12 {
            tracker.insert_note(id, "alice", now, "on it");
        }

        let outcome = reconciler(&tracker, 600)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::NoteAppended {
                ticket_id: id,
                authored_notes: 1
            }
        );
    }

    #[tokio::test]
    async fn test_closed_ticket_never_matches() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let closed = tracker.insert_ticket("Disk full", TicketState::Closed);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert!(matches!(outcome, ReconcileOutcome::Created { ticket_id } if ticket_id != closed));
        assert_eq!(tracker.count_titled("Disk full"), 2);
    }

    #[tokio::test]
    async fn test_earliest_open_ticket_wins() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        tracker.insert_ticket("Disk full", TicketState::Closed);
        let oldest_open = tracker.insert_ticket("Disk full", TicketState::Opened);
        tracker.insert_ticket("Disk full", TicketState::Opened);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert_eq!(
            outcome,
            ReconcileOutcome::NoteAppended {
                ticket_id: oldest_open,
                authored_notes: 1
            }
        );
    }

    #[tokio::test]
    async fn test_label_dedup_key() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        let config = ReconcilerConfig::new(BOT)
            .with_dedup(DedupStrategy::from_labels(["deployment", "environment"]));
        let reconciler = Reconciler::new(Arc::clone(&tracker), TrackerHealth::new(), config);

        let alert = Alert::firing("Pod crash looping", "")
            .with_label("deployment", "web")
            .with_label("environment", "prod");
        let outcome = reconciler.reconcile(&alert).await;

        let ReconcileOutcome::Created { ticket_id } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(tracker.ticket(ticket_id).unwrap().title, "web / prod");
    }

    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl WarnCounter {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_label_fallback_warns_only_for_firing_alerts() {
        let warns = WarnCounter::default();
        let _default =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(warns.clone()));

        let tracker = Arc::new(FakeTracker::new(BOT));
        let config = ReconcilerConfig::new(BOT).with_dedup(DedupStrategy::from_labels(["deployment"]));
        let reconciler = Reconciler::new(Arc::clone(&tracker), TrackerHealth::new(), config);

        let outcome = reconciler.reconcile(&Alert::resolved("Pod crash looping", "")).await;
        assert!(matches!(outcome, ReconcileOutcome::Dropped { .. }));
        assert_eq!(warns.count(), 0);
        assert_eq!(tracker.api_calls(), 0);

        let outcome = reconciler.reconcile(&Alert::firing("Pod crash looping", "")).await;
        let ReconcileOutcome::Created { ticket_id } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(tracker.ticket(ticket_id).unwrap().title, "Pod crash looping");
        assert!(warns.count() >= 1);
    }

    #[tokio::test]
    async fn test_create_failure_is_reported() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        tracker.set_fail_writes(true);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert!(matches!(outcome, ReconcileOutcome::CreateFailed { .. }));
        assert!(!outcome.wrote());
        assert!(tracker.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_note_failure_is_reported() {
        let tracker = Arc::new(FakeTracker::new(BOT));
        tracker.insert_ticket("Disk full", TicketState::Opened);
        tracker.set_fail_writes(true);

        let outcome = reconciler(&tracker, 10)
            .reconcile(&Alert::firing("Disk full", ""))
            .await;

        assert!(matches!(
            outcome,
            ReconcileOutcome::Failed {
                stage: ReconcileStage::Note,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_alerts_create_one_ticket() {
        let tracker = Arc::new(FakeTracker::new(BOT).with_latency(Duration::from_millis(20)));
        let reconciler = Arc::new(reconciler(&tracker, 600));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    reconciler.reconcile(&Alert::firing("Disk full", "")).await
                })
            })
            .collect();
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let created = outcomes
            .iter()
            .filter(|o| matches!(o, ReconcileOutcome::Created { .. }))
            .count();
        assert_eq!(created, 1);
        assert_eq!(tracker.count_titled("Disk full"), 1);
        assert_eq!(reconciler.keys_in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_key_lock_races_duplicate() {
        let tracker = Arc::new(FakeTracker::new(BOT).with_latency(Duration::from_millis(20)));
        let config = ReconcilerConfig::new(BOT).with_key_lock(false);
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&tracker),
            TrackerHealth::new(),
            config,
        ));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    reconciler.reconcile(&Alert::firing("Disk full", "")).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tracker.count_titled("Disk full"), 3);
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(ReconcileOutcome::Rejected.as_str(), "rejected");
        assert_eq!(ReconcileOutcome::Created { ticket_id: 1 }.as_str(), "created");
        assert!(ReconcileOutcome::FinalNoteAppended { ticket_id: 1 }.wrote());
        assert_eq!(ReconcileStage::Fetch.to_string(), "fetch");
    }
}
