//! HTTP request handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use issue_exporter::{TicketTracker, parse_alert};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Result of the most recent tracker probe.
    pub tracker_healthy: bool,
    /// When the most recent probe finished.
    pub last_checked: Option<DateTime<Utc>>,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle POST / - Alertmanager webhook.
///
/// Any JSON body is acknowledged with 200, whatever the reconciler decided;
/// only a body that is not JSON at all is rejected.
pub async fn receive_alert<T: TicketTracker>(
    State(state): State<Arc<AppState<T>>>,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ServerError::InvalidPayload(e.to_string()))?;

    let alert = match parse_alert(&payload) {
        Ok(alert) => alert,
        Err(e) => {
            warn!(error = %e, "dropping malformed alert");
            return Ok(StatusCode::OK);
        }
    };

    state.reconciler().reconcile(&alert).await;
    Ok(StatusCode::OK)
}

/// Handle GET /health - liveness and tracker status.
pub async fn health_check<T: TicketTracker>(
    State(state): State<Arc<AppState<T>>>,
) -> Json<HealthResponse> {
    let health = state.health();
    Json(HealthResponse {
        status: "ok".to_string(),
        tracker_healthy: health.is_healthy(),
        last_checked: health.last_checked(),
        uptime_secs: state.uptime_secs(),
    })
}
