use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use wishlist_edge_core::{Lifecycle, StatsSnapshot};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub state: Lifecycle,
    pub version: String,
    pub stats: StatsSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// 200 once the controller is active, 503 before that or after a failed install.
pub async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    let lifecycle = state.controller.state();
    let (code, status) = match lifecycle {
        Lifecycle::Active => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    let health = Health {
        status,
        state: lifecycle,
        version: state.controller.version().to_string(),
        stats: state.controller.stats().snapshot(),
        timestamp: Utc::now(),
    };
    (code, Json(health))
}
