//! The issue-tracker seam.
//!
//! [`TicketTracker`] is the only way the reconciler and the connectivity
//! monitor talk to the outside world. [`GitLabTracker`](crate::gitlab::GitLabTracker)
//! is the production implementation and [`FakeTracker`](crate::fake::FakeTracker)
//! the in-memory one used in tests.

use std::future::Future;

use crate::error::Result;
use crate::types::{Note, Ticket};

/// Operations the exporter needs from an issue tracker.
#[allow(async_fn_in_trait)]
pub trait TicketTracker: Send + Sync + 'static {
    /// Searches tickets matching `query`, oldest first.
    ///
    /// Implementations should restrict results to open tickets when the
    /// backend supports it; callers still check [`Ticket::state`].
    /// Returned tickets carry no notes.
    fn search_open_tickets(&self, query: &str)
    -> impl Future<Output = Result<Vec<Ticket>>> + Send;

    /// Fetches one ticket including all of its notes in creation order.
    fn get_ticket(&self, id: u64) -> impl Future<Output = Result<Ticket>> + Send;

    /// Opens a new ticket.
    fn create_ticket(
        &self,
        title: &str,
        description: &str,
    ) -> impl Future<Output = Result<Ticket>> + Send;

    /// Appends a note to a ticket as the tracker's authenticated identity.
    fn create_note(&self, ticket_id: u64, body: &str) -> impl Future<Output = Result<Note>> + Send;

    /// Cheap reachability check against the tracker's base URL.
    fn head_check(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Picks the match among search results: the earliest-created open ticket,
/// ties broken by the lowest id.
#[must_use]
pub fn earliest_open(tickets: Vec<Ticket>) -> Option<Ticket> {
    tickets
        .into_iter()
        .filter(Ticket::is_open)
        .min_by_key(|t| (t.created_at, t.id))
}
