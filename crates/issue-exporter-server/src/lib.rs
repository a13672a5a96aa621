//! # issue-exporter-server
//!
//! HTTP front end for the issue exporter: receives Alertmanager webhook
//! deliveries and hands firing alerts to the reconciler, while a background
//! monitor keeps track of whether the tracker is reachable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use issue_exporter::{GitLabConfig, GitLabTracker};
//! use issue_exporter_server::{ExporterServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default()
//!         .with_gitlab(GitLabConfig::new("https://gitlab.com", "38561817").with_token("glpat-..."));
//!     let tracker = GitLabTracker::new(&config.gitlab)?;
//!     let addr = config.bind_addr;
//!
//!     ExporterServer::new(config, tracker).serve(addr).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/` | POST | Alertmanager webhook |
//! | `/health` | GET | Liveness and tracker reachability |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Cli, LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::ExporterServer;
pub use state::AppState;
