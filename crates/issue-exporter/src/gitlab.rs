//! GitLab REST v4 implementation of [`TicketTracker`].
//!
//! Tickets are project issues addressed by their project-scoped `iid`; notes
//! are issue notes. Authentication uses a personal or project access token
//! sent in the `PRIVATE-TOKEN` header.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, TrackerError};
use crate::tracker::TicketTracker;
use crate::types::{Note, Ticket, TicketState};

/// Notes fetched per page.
const NOTES_PER_PAGE: u32 = 100;

/// Upper bound on note pages followed for one ticket.
const MAX_NOTE_PAGES: u32 = 50;

/// Longest error body kept in a [`TrackerError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// Settings for a [`GitLabTracker`].
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance, e.g. `https://gitlab.com`.
    pub base_url: String,
    /// Numeric project id or `group/project` path.
    pub project: String,
    /// Access token; empty means anonymous.
    pub token: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gitlab.com".to_string(),
            project: String::new(),
            token: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl GitLabConfig {
    /// Creates a configuration for `project` on `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project: project.into(),
            ..Self::default()
        }
    }

    /// Sets the access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A GitLab project used as ticket tracker.
#[derive(Debug, Clone)]
pub struct GitLabTracker {
    client: Client,
    base_url: Url,
    project_url: String,
}

impl GitLabTracker {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Config` if the base URL is not http(s), the
    /// project is empty, or the token is not a valid header value.
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| TrackerError::Config {
            reason: format!("invalid base URL '{}': {e}", config.base_url),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TrackerError::Config {
                reason: format!("base URL must be http or https, got '{}'", base_url.scheme()),
            });
        }

        let project = config.project.trim();
        if project.is_empty() {
            return Err(TrackerError::Config {
                reason: "project cannot be empty".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        if !config.token.is_empty() {
            let mut value =
                HeaderValue::from_str(&config.token).map_err(|e| TrackerError::Config {
                    reason: format!("invalid token: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert("PRIVATE-TOKEN", value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(concat!("issue-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let project_url = format!(
            "{}/api/v4/projects/{}",
            base_url.as_str().trim_end_matches('/'),
            encode_project(project)
        );

        Ok(Self {
            client,
            base_url,
            project_url,
        })
    }

    /// The base URL probed by [`TicketTracker::head_check`].
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The project API root, `{base}/api/v4/projects/{project}`.
    #[must_use]
    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    fn issue_url(&self, iid: u64) -> String {
        format!("{}/issues/{iid}", self.project_url)
    }

    async fn fetch_notes(&self, iid: u64) -> Result<Vec<Note>> {
        let url = format!("{}/notes", self.issue_url(iid));
        let mut notes = Vec::new();
        let mut page = 1;

        let per_page = NOTES_PER_PAGE.to_string();

        loop {
            let page_param = page.to_string();
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("sort", "asc"),
                    ("order_by", "created_at"),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ])
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let next = next_page(&response);
            let batch: Vec<GitLabNote> = response.json().await?;
            notes.extend(batch.into_iter().map(Note::from));

            match next {
                Some(n) if n > page && n <= MAX_NOTE_PAGES => page = n,
                Some(n) if n > MAX_NOTE_PAGES => {
                    warn!(
                        iid,
                        max_pages = MAX_NOTE_PAGES,
                        fetched = notes.len(),
                        "note pagination capped, later notes are ignored"
                    );
                    break;
                }
                _ => break,
            }
        }

        debug!(iid, count = notes.len(), "fetched issue notes");
        Ok(notes)
    }
}

impl TicketTracker for GitLabTracker {
    async fn search_open_tickets(&self, query: &str) -> Result<Vec<Ticket>> {
        let response = self
            .client
            .get(format!("{}/search", self.project_url))
            .query(&[
                ("scope", "issues"),
                ("search", query),
                ("state", "opened"),
                ("order_by", "created_at"),
                ("sort", "asc"),
            ])
            .send()
            .await?;
        let issues: Vec<GitLabIssue> = ensure_success(response).await?.json().await?;

        let mut tickets: Vec<Ticket> = issues.into_iter().map(Ticket::from).collect();
        tickets.sort_by_key(|t| (t.created_at, t.id));
        Ok(tickets)
    }

    async fn get_ticket(&self, id: u64) -> Result<Ticket> {
        let response = self.client.get(self.issue_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound { id });
        }
        let issue: GitLabIssue = ensure_success(response).await?.json().await?;

        let mut ticket = Ticket::from(issue);
        ticket.notes = self.fetch_notes(id).await?;
        Ok(ticket)
    }

    async fn create_ticket(&self, title: &str, description: &str) -> Result<Ticket> {
        let response = self
            .client
            .post(format!("{}/issues", self.project_url))
            .json(&NewIssue { title, description })
            .send()
            .await?;
        let issue: GitLabIssue = ensure_success(response).await?.json().await?;
        Ok(Ticket::from(issue))
    }

    async fn create_note(&self, ticket_id: u64, body: &str) -> Result<Note> {
        let response = self
            .client
            .post(format!("{}/notes", self.issue_url(ticket_id)))
            .json(&NewNote { body })
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound { id: ticket_id });
        }
        let note: GitLabNote = ensure_success(response).await?.json().await?;
        Ok(Note::from(note))
    }

    async fn head_check(&self) -> Result<()> {
        let response = self.client.head(self.base_url.clone()).send().await?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(TrackerError::Rejected {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            })
        }
    }
}

/// Encodes a project path so `group/project` becomes one URL segment.
///
/// GitLab namespace and project paths only contain letters, digits, `-`,
/// `_`, `.` and `/`, so only the slash needs escaping.
fn encode_project(project: &str) -> String {
    project.replace('/', "%2F")
}

fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or_default().to_string();
    }

    Err(TrackerError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct NewNote<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct GitLabIssue {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    web_url: Option<String>,
}

impl From<GitLabIssue> for Ticket {
    fn from(issue: GitLabIssue) -> Self {
        let state = if issue.state == "opened" {
            TicketState::Opened
        } else {
            TicketState::Closed
        };
        Self {
            id: issue.iid,
            title: issue.title,
            description: issue.description.unwrap_or_default(),
            state,
            created_at: issue.created_at,
            web_url: issue.web_url,
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitLabAuthor {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GitLabNote {
    body: String,
    author: GitLabAuthor,
    created_at: DateTime<Utc>,
}

impl From<GitLabNote> for Note {
    fn from(note: GitLabNote) -> Self {
        Self {
            author: note.author.username,
            created_at: note.created_at,
            body: note.body,
        }
    }
}
