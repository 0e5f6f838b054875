//! Fallback route: every request the edge does not own becomes a fetch event.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::response::Response;
use wishlist_edge_client::fetch::end_to_end;
use wishlist_edge_client::upstream_url;
use wishlist_edge_core::Request as FetchRequest;

use crate::error::EdgeError;
use crate::state::AppState;

/// Largest request body relayed upstream.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub async fn proxy(State(state): State<Arc<AppState>>, request: Request) -> Result<Response, EdgeError> {
    let target = request.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = upstream_url(&state.upstream, target)?;

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| EdgeError::BadBody(e.to_string()))?;

    let fetch = FetchRequest { method: parts.method, url, headers: end_to_end(&parts.headers), body };
    let served = state.controller.handle_fetch(fetch).await?;
    tracing::debug!(outcome = ?served.outcome, status = served.response.status.as_u16(), "served");

    let mut response = Response::new(Body::from(served.response.body));
    *response.status_mut() = served.response.status;
    *response.headers_mut() = served.response.headers;
    Ok(response)
}
