//! Throttling policy for follow-up notes on an existing ticket.
//!
//! The exporter counts only the notes written by its own identity. Below the
//! cap it adds a "still firing" note once per grace period; at the cap it adds
//! one final note; past the cap it stays silent.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::Ticket;

/// Default number of "still firing" notes before the final note.
pub const DEFAULT_MAX_NOTES: usize = 10;

/// Default minimum time between two notes on the same ticket.
///
/// Deployments have used both 1 and 600 seconds; 600 is the shipped default
/// and is overridable through configuration.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(600);

/// Text identifying the final note, used to avoid writing it twice.
pub const FINAL_NOTE_MARKER: &str = "Maximum number of notes reached for issue";

/// What to do with an already-open ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteDecision {
    /// Append a "still firing" note.
    Append,
    /// Append the final "maximum reached" note.
    AppendFinal,
    /// The grace period has not elapsed yet.
    Suppress {
        /// Time since the last authored note.
        elapsed: Duration,
        /// Time left until the grace period ends.
        remaining: Duration,
    },
    /// The final note was already written; nothing more to add.
    Exhausted,
}

/// Summary of the notes a given identity wrote on a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthoredNotes {
    /// Number of notes by the identity.
    pub count: usize,
    /// Creation time of the most recent one.
    pub latest: Option<DateTime<Utc>>,
    /// Whether one of them is the final note.
    pub has_final: bool,
}

impl AuthoredNotes {
    /// Collects the notes `username` wrote on `ticket`.
    #[must_use]
    pub fn collect(ticket: &Ticket, username: &str) -> Self {
        ticket.notes_by(username).fold(Self::default(), |acc, note| Self {
            count: acc.count + 1,
            latest: Some(acc.latest.map_or(note.created_at, |l| l.max(note.created_at))),
            has_final: acc.has_final || note.body.contains(FINAL_NOTE_MARKER),
        })
    }
}

/// Note cap and grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotePolicy {
    /// Authored-note count at which the final note is written.
    pub max_notes: usize,
    /// Minimum time between two "still firing" notes.
    pub grace_period: Duration,
}

impl Default for NotePolicy {
    fn default() -> Self {
        Self {
            max_notes: DEFAULT_MAX_NOTES,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl NotePolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_notes: usize, grace_period: Duration) -> Self {
        Self {
            max_notes,
            grace_period,
        }
    }

    /// Decides what to do given the authored notes on a ticket.
    ///
    /// The grace period applies only to "still firing" notes. A note dated in
    /// the future counts as zero seconds old.
    #[must_use]
    pub fn decide(&self, notes: &AuthoredNotes, now: DateTime<Utc>) -> NoteDecision {
        if notes.has_final || notes.count > self.max_notes {
            return NoteDecision::Exhausted;
        }
        if notes.count == self.max_notes {
            return NoteDecision::AppendFinal;
        }

        if let Some(latest) = notes.latest {
            let elapsed = (now - latest).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.grace_period {
                return NoteDecision::Suppress {
                    elapsed,
                    remaining: self.grace_period - elapsed,
                };
            }
        }

        NoteDecision::Append
    }
}

/// Body of a "still firing" note.
#[must_use]
pub fn still_firing_body(now: DateTime<Utc>) -> String {
    format!("`{}`: Issue not yet resolved", format_timestamp(now))
}

/// Body of the final note.
#[must_use]
pub fn final_note_body(now: DateTime<Utc>) -> String {
    format!(
        "`{}`: {FINAL_NOTE_MARKER}. Issue will no longer be updated",
        format_timestamp(now)
    )
}

fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
