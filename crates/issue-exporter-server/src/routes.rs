//! Route configuration for the webhook.

use std::sync::Arc;

use axum::routing::{Router, get, post};
use issue_exporter::TicketTracker;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, receive_alert};
use crate::state::AppState;

/// Create the webhook router.
pub fn create_router<T: TicketTracker>(state: Arc<AppState<T>>) -> Router {
    Router::new()
        .route("/", post(receive_alert::<T>))
        .route("/health", get(health_check::<T>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
