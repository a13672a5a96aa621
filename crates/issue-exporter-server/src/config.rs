//! Server configuration: command line, environment, and secret files.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use issue_exporter::monitor::DEFAULT_PROBE_INTERVAL;
use issue_exporter::{DedupStrategy, GitLabConfig, NotePolicy, ReconcilerConfig};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// File name of the token secret inside the secrets directory.
pub const TOKEN_FILE: &str = "token";

/// File name of the username secret inside the secrets directory.
pub const USERNAME_FILE: &str = "username";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Text,
}

/// Alertmanager webhook that files alerts as GitLab issues.
#[derive(Parser, Debug, Clone)]
#[command(name = "issue-exporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address the webhook listens on.
    #[arg(long = "bind", env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// Base URL of the GitLab instance.
    #[arg(long, env = "GITLAB_URL", default_value = "https://gitlab.com")]
    pub gitlab_url: String,

    /// Project id or `group/project` path that receives the issues.
    #[arg(long, env = "GITLAB_PROJECT_ID", default_value = "38561817")]
    pub project_id: String,

    /// GitLab username of the access token's owner.
    #[arg(long, env = "GITLAB_USERNAME", default_value = "gitlab-issue-exporter")]
    pub username: String,

    /// GitLab access token.
    #[arg(long, env = "GITLAB_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Seconds between two "still firing" notes on one issue.
    #[arg(long, env = "GRACE_PERIOD", default_value_t = 600)]
    pub grace_period: u64,

    /// Number of "still firing" notes before the final note.
    #[arg(long, env = "MAX_NOTES", default_value_t = 10)]
    pub max_notes: usize,

    /// Seconds between two connectivity probes.
    #[arg(long, env = "PROBE_INTERVAL", default_value_t = 60)]
    pub probe_interval: u64,

    /// Timeout in seconds for every GitLab request.
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Comma separated label names forming the dedup key; empty uses the title.
    #[arg(long, env = "DEDUP_LABELS", value_delimiter = ',')]
    pub dedup_labels: Vec<String>,

    /// Process alerts with the same dedup key concurrently.
    #[arg(long = "no-key-lock", env = "DISABLE_KEY_LOCK")]
    pub no_key_lock: bool,

    /// Directory holding `token` and `username` files.
    #[arg(long, env = "SECRETS_DIR", default_value = "/etc/gitlab-issue-exporter")]
    pub secrets_dir: PathBuf,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Resolves secrets and builds a validated [`ServerConfig`].
    ///
    /// Files in the secrets directory take precedence over flags and
    /// environment variables.
    pub async fn into_config(self) -> ServerResult<ServerConfig> {
        let mut token = self.token;
        let mut username = self.username;

        if let Some(secret) = read_secret(&self.secrets_dir.join(TOKEN_FILE)).await? {
            info!("using token from secrets directory");
            token = secret;
        }
        if let Some(secret) = read_secret(&self.secrets_dir.join(USERNAME_FILE)).await? {
            info!("using username from secrets directory");
            username = secret;
        }
        if token.is_empty() {
            warn!("no GitLab token configured, requests will be anonymous");
        }

        let gitlab = GitLabConfig::new(self.gitlab_url, self.project_id)
            .with_token(token)
            .with_timeout(Duration::from_secs(self.request_timeout));
        let reconciler = ReconcilerConfig::new(username)
            .with_policy(NotePolicy::new(
                self.max_notes,
                Duration::from_secs(self.grace_period),
            ))
            .with_dedup(DedupStrategy::from_labels(self.dedup_labels))
            .with_key_lock(!self.no_key_lock);

        let config = ServerConfig {
            bind_addr: self.bind_addr,
            gitlab,
            reconciler,
            probe_interval: Duration::from_secs(self.probe_interval),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Reads a secret file, trimming surrounding whitespace.
///
/// Returns `None` if the file does not exist.
pub async fn read_secret(path: &Path) -> ServerResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServerError::Secret(path.to_path_buf(), e)),
    }
}

/// Configuration for the webhook server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// GitLab client settings.
    pub gitlab: GitLabConfig,
    /// Reconciler settings.
    pub reconciler: ReconcilerConfig,
    /// Time between connectivity probes.
    pub probe_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            gitlab: GitLabConfig::new("https://gitlab.com", "38561817"),
            reconciler: ReconcilerConfig::default(),
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the GitLab client settings.
    #[must_use]
    pub fn with_gitlab(mut self, gitlab: GitLabConfig) -> Self {
        self.gitlab = gitlab;
        self
    }

    /// Set the reconciler settings.
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: ReconcilerConfig) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Set the probe interval.
    #[must_use]
    pub const fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Checks the settings that would otherwise fail at runtime.
    pub fn validate(&self) -> ServerResult<()> {
        let url = self.gitlab.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServerError::Config(format!(
                "GitLab URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.gitlab.project.trim().is_empty() {
            return Err(ServerError::Config("project id cannot be empty".to_string()));
        }
        if self.reconciler.bot_username.trim().is_empty() {
            return Err(ServerError::Config("username cannot be empty".to_string()));
        }
        if self.gitlab.timeout.is_zero() {
            return Err(ServerError::Config("request timeout must be positive".to_string()));
        }
        if self.probe_interval.is_zero() {
            return Err(ServerError::Config("probe interval must be positive".to_string()));
        }
        if self.reconciler.policy.max_notes == 0 {
            return Err(ServerError::Config("max notes must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["issue-exporter"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn empty_secrets() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[tokio::test]
    async fn test_flags_build_config() {
        let secrets = empty_secrets();
        let cli = parse(&[
            "--bind",
            "127.0.0.1:9000",
            "--gitlab-url",
            "https://git.example.com",
            "--project-id",
            "ops/alerts",
            "--username",
            "alert-bot",
            "--token",
            "glpat-flag",
            "--grace-period",
            "30",
            "--max-notes",
            "3",
            "--probe-interval",
            "5",
            "--request-timeout",
            "2",
            "--dedup-labels",
            "deployment,environment",
            "--no-key-lock",
            "--secrets-dir",
            secrets.path().to_str().unwrap(),
            "--log-format",
            "text",
        ]);
        assert_eq!(cli.log_format, LogFormat::Text);

        let config = cli.into_config().await.unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.gitlab.base_url, "https://git.example.com");
        assert_eq!(config.gitlab.project, "ops/alerts");
        assert_eq!(config.gitlab.token, "glpat-flag");
        assert_eq!(config.gitlab.timeout, Duration::from_secs(2));
        assert_eq!(config.reconciler.bot_username, "alert-bot");
        assert_eq!(config.reconciler.policy, NotePolicy::new(3, Duration::from_secs(30)));
        assert_eq!(
            config.reconciler.dedup,
            DedupStrategy::Labels(vec!["deployment".to_string(), "environment".to_string()])
        );
        assert!(!config.reconciler.serialize_per_key);
        assert_eq!(config.probe_interval, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_secret_files_take_precedence() {
        let secrets = empty_secrets();
        std::fs::write(secrets.path().join(TOKEN_FILE), "glpat-from-file\n").unwrap();
        std::fs::write(secrets.path().join(USERNAME_FILE), "  file-bot \n").unwrap();

        let config = parse(&[
            "--token",
            "glpat-flag",
            "--username",
            "flag-bot",
            "--secrets-dir",
            secrets.path().to_str().unwrap(),
        ])
        .into_config()
        .await
        .unwrap();

        assert_eq!(config.gitlab.token, "glpat-from-file");
        assert_eq!(config.reconciler.bot_username, "file-bot");
    }

    #[tokio::test]
    async fn test_missing_secret_files_keep_flags() {
        let secrets = empty_secrets();
        let config = parse(&[
            "--token",
            "glpat-flag",
            "--secrets-dir",
            secrets.path().join("missing").to_str().unwrap(),
        ])
        .into_config()
        .await
        .unwrap();

        assert_eq!(config.gitlab.token, "glpat-flag");
    }

    #[tokio::test]
    async fn test_unreadable_secret_is_an_error() {
        let secrets = empty_secrets();
        // A directory where a file is expected cannot be read as a string.
        std::fs::create_dir(secrets.path().join(TOKEN_FILE)).unwrap();

        let err = read_secret(&secrets.path().join(TOKEN_FILE)).await.unwrap_err();
        assert!(matches!(err, ServerError::Secret(_, _)));
    }

    #[test_case("ftp://gitlab.com", "1", "bot", 60, 10 ; "non http url")]
    #[test_case("https://gitlab.com", " ", "bot", 60, 10 ; "empty project")]
    #[test_case("https://gitlab.com", "1", "", 60, 10 ; "empty username")]
    #[test_case("https://gitlab.com", "1", "bot", 0, 10 ; "zero probe interval")]
    #[test_case("https://gitlab.com", "1", "bot", 60, 0 ; "zero max notes")]
    fn test_validate_rejects(url: &str, project: &str, username: &str, probe: u64, max_notes: usize) {
        let config = ServerConfig::default()
            .with_gitlab(GitLabConfig::new(url, project))
            .with_reconciler(
                ReconcilerConfig::new(username)
                    .with_policy(NotePolicy::new(max_notes, Duration::from_secs(1))),
            )
            .with_probe_interval(Duration::from_secs(probe));

        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_zero_request_timeout_is_rejected() {
        let config = ServerConfig::default()
            .with_gitlab(GitLabConfig::new("https://gitlab.com", "1").with_timeout(Duration::ZERO));
        let Err(ServerError::Config(reason)) = config.validate() else {
            panic!("expected a config error");
        };
        assert!(reason.contains("request timeout"));

        let secrets = empty_secrets();
        let cli = parse(&[
            "--request-timeout",
            "0",
            "--secrets-dir",
            secrets.path().to_str().unwrap(),
        ]);
        assert!(matches!(cli.into_config().await, Err(ServerError::Config(_))));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.probe_interval, Duration::from_secs(60));
        assert!(config.reconciler.serialize_per_key);
    }
}
