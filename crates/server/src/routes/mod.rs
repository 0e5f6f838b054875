//! HTTP surface of the edge.
//!
//! `/share-target` and `/healthz` are answered by the edge itself; every
//! other request is relayed through the cache controller.

pub mod health;
pub mod proxy;
pub mod share;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/share-target", get(share::share_get).post(share::share_post))
        .route("/healthz", get(health::healthz))
        .fallback(proxy::proxy)
        .with_state(state)
}
