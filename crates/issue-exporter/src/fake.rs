//! In-memory [`TicketTracker`] for tests and local runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;

use crate::error::{Result, TrackerError};
use crate::tracker::TicketTracker;
use crate::types::{Note, Ticket, TicketState};

/// Per-operation call counters.
#[derive(Debug, Default)]
struct Calls {
    search: AtomicUsize,
    get: AtomicUsize,
    create_ticket: AtomicUsize,
    create_note: AtomicUsize,
    head: AtomicUsize,
}

/// A tracker that keeps tickets in memory.
///
/// Search is a case-insensitive substring match on the title, oldest first.
/// Tickets get strictly increasing creation times so ordering is stable.
#[derive(Debug)]
pub struct FakeTracker {
    username: String,
    tickets: RwLock<Vec<Ticket>>,
    calls: Calls,
    latency: Duration,
    reachable: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self::new("gitlab-issue-exporter")
    }
}

impl FakeTracker {
    /// Creates an empty tracker whose notes are authored by `username`.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tickets: RwLock::new(Vec::new()),
            calls: Calls::default(),
            latency: Duration::ZERO,
            reachable: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Delays every operation, to widen race windows in concurrency tests.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes `head_check` succeed or fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Makes ticket and note creation fail with a 500.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts a ticket directly, bypassing call counters. Returns its id.
    pub fn insert_ticket(&self, title: impl Into<String>, state: TicketState) -> u64 {
        let mut tickets = self.tickets.write();
        let ticket = Self::new_ticket(&tickets, title.into(), String::new(), state);
        let id = ticket.id;
        tickets.push(ticket);
        id
    }

    /// Inserts a note directly, bypassing call counters.
    ///
    /// Does nothing if the ticket does not exist.
    pub fn insert_note(
        &self,
        ticket_id: u64,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
        body: impl Into<String>,
    ) {
        if let Some(ticket) = self.tickets.write().iter_mut().find(|t| t.id == ticket_id) {
            ticket.notes.push(Note {
                author: author.into(),
                created_at,
                body: body.into(),
            });
        }
    }

    /// Changes the state of a ticket.
    pub fn set_state(&self, ticket_id: u64, state: TicketState) {
        if let Some(ticket) = self.tickets.write().iter_mut().find(|t| t.id == ticket_id) {
            ticket.state = state;
        }
    }

    /// Snapshot of all tickets.
    #[must_use]
    pub fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().clone()
    }

    /// Snapshot of one ticket.
    #[must_use]
    pub fn ticket(&self, id: u64) -> Option<Ticket> {
        self.tickets.read().iter().find(|t| t.id == id).cloned()
    }

    /// Number of tickets whose title equals `title`.
    #[must_use]
    pub fn count_titled(&self, title: &str) -> usize {
        self.tickets.read().iter().filter(|t| t.title == title).count()
    }

    /// Total number of calls made through the [`TicketTracker`] interface,
    /// excluding `head_check`.
    #[must_use]
    pub fn api_calls(&self) -> usize {
        self.search_calls() + self.get_calls() + self.create_ticket_calls() + self.create_note_calls()
    }

    /// Number of `search_open_tickets` calls.
    #[must_use]
    pub fn search_calls(&self) -> usize {
        self.calls.search.load(Ordering::SeqCst)
    }

    /// Number of `get_ticket` calls.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.calls.get.load(Ordering::SeqCst)
    }

    /// Number of `create_ticket` calls.
    #[must_use]
    pub fn create_ticket_calls(&self) -> usize {
        self.calls.create_ticket.load(Ordering::SeqCst)
    }

    /// Number of `create_note` calls.
    #[must_use]
    pub fn create_note_calls(&self) -> usize {
        self.calls.create_note.load(Ordering::SeqCst)
    }

    /// Number of `head_check` calls.
    #[must_use]
    pub fn head_calls(&self) -> usize {
        self.calls.head.load(Ordering::SeqCst)
    }

    fn new_ticket(
        existing: &[Ticket],
        title: String,
        description: String,
        state: TicketState,
    ) -> Ticket {
        let id = existing.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let created_at = existing
            .iter()
            .map(|t| t.created_at + TimeDelta::microseconds(1))
            .max()
            .map_or(now, |next| next.max(now));
        Ticket {
            id,
            title,
            description,
            state,
            created_at,
            web_url: Some(format!("https://tracker.invalid/issues/{id}")),
            notes: Vec::new(),
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TrackerError::Rejected {
                status: 500,
                message: "write failure injected".to_string(),
            });
        }
        Ok(())
    }
}

impl TicketTracker for FakeTracker {
    async fn search_open_tickets(&self, query: &str) -> Result<Vec<Ticket>> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let needle = query.to_lowercase();
        let mut found: Vec<Ticket> = self
            .tickets
            .read()
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .map(|t| Ticket {
                notes: Vec::new(),
                ..t.clone()
            })
            .collect();
        found.sort_by_key(|t| (t.created_at, t.id));
        Ok(found)
    }

    async fn get_ticket(&self, id: u64) -> Result<Ticket> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        self.ticket(id).ok_or(TrackerError::NotFound { id })
    }

    async fn create_ticket(&self, title: &str, description: &str) -> Result<Ticket> {
        self.calls.create_ticket.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check_writable()?;

        let mut tickets = self.tickets.write();
        let ticket = Self::new_ticket(
            &tickets,
            title.to_string(),
            description.to_string(),
            TicketState::Opened,
        );
        tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn create_note(&self, ticket_id: u64, body: &str) -> Result<Note> {
        self.calls.create_note.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check_writable()?;

        let mut tickets = self.tickets.write();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or(TrackerError::NotFound { id: ticket_id })?;
        let note = Note {
            author: self.username.clone(),
            created_at: Utc::now(),
            body: body.to_string(),
        };
        ticket.notes.push(note.clone());
        Ok(note)
    }

    async fn head_check(&self) -> Result<()> {
        self.calls.head.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TrackerError::Unreachable {
                reason: "tracker marked unreachable".to_string(),
            })
        }
    }
}
