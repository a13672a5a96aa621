//! issue-exporter - Alertmanager webhook that files alerts as GitLab issues.

use clap::Parser;
use issue_exporter::GitLabTracker;
use issue_exporter_server::{Cli, ExporterServer, LogFormat};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "issue_exporter=debug,issue_exporter_server=debug,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = cli.into_config().await?;
    info!(
        gitlab_url = %config.gitlab.base_url,
        project = %config.gitlab.project,
        username = %config.reconciler.bot_username,
        grace_period_secs = config.reconciler.policy.grace_period.as_secs(),
        max_notes = config.reconciler.policy.max_notes,
        "starting issue exporter"
    );

    let tracker = GitLabTracker::new(&config.gitlab)?;
    let addr = config.bind_addr;
    ExporterServer::new(config, tracker)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Text => registry.with(fmt::layer()).try_init()?,
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
