//! Core types shared by the reconciler and tracker implementations.
//!
//! - [`AlertStatus`] / [`Alert`]: one decoded webhook delivery
//! - [`TicketState`] / [`Ticket`]: an issue owned by the tracker
//! - [`Note`]: a comment on a ticket

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an inbound alert group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The alert condition is active.
    Firing,
    /// The alert condition has cleared.
    Resolved,
}

impl AlertStatus {
    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }

    /// Parses the wire representation used by Alertmanager.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "firing" => Some(Self::Firing),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single alert as received by the webhook.
///
/// Alerts only live for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Whether the alert is firing or resolved.
    pub status: AlertStatus,
    /// Human readable title, taken from the `message` annotation.
    pub title: String,
    /// Longer description, taken from the `description` annotation.
    pub description: String,
    /// Common labels of the alert group.
    pub labels: BTreeMap<String, String>,
}

impl Alert {
    /// Creates a firing alert with no labels.
    #[must_use]
    pub fn firing(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            status: AlertStatus::Firing,
            title: title.into(),
            description: description.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Creates a resolved alert with no labels.
    #[must_use]
    pub fn resolved(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            status: AlertStatus::Resolved,
            ..Self::firing(title, description)
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns true if the alert is firing.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.status == AlertStatus::Firing
    }
}

/// State of a tracker ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    /// The ticket is open.
    Opened,
    /// The ticket was closed.
    Closed,
}

impl TicketState {
    /// Returns the state as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A comment on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Username of the note author.
    pub author: String,
    /// When the note was created.
    pub created_at: DateTime<Utc>,
    /// Markdown body of the note.
    pub body: String,
}

impl Note {
    /// Returns true if the note was written by `username`.
    #[must_use]
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author == username
    }
}

/// An issue-tracker ticket.
///
/// Search results carry no notes; [`TicketTracker::get_ticket`](crate::tracker::TicketTracker::get_ticket)
/// returns the ticket with its notes in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Project-scoped ticket number.
    pub id: u64,
    /// Ticket title.
    pub title: String,
    /// Ticket body.
    #[serde(default)]
    pub description: String,
    /// Current state.
    pub state: TicketState,
    /// When the ticket was created.
    pub created_at: DateTime<Utc>,
    /// Link to the ticket in the tracker UI, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    /// Notes in creation order.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Ticket {
    /// Returns true if the ticket is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TicketState::Opened
    }

    /// Iterates over the notes written by `username`.
    pub fn notes_by<'a>(&'a self, username: &'a str) -> impl Iterator<Item = &'a Note> + 'a {
        self.notes.iter().filter(move |n| n.is_authored_by(username))
    }
}
