//! Structured errors for the edge server.
//!
//! These map onto the HTTP status returned to the browser.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wishlist_edge_client::UrlError;
use wishlist_edge_core::Error;

/// Errors raised while relaying a request through the controller.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// The request target cannot be mapped onto the upstream.
    #[error("INVALID_URL: {0}")]
    BadTarget(#[from] UrlError),

    /// The request body could not be read.
    #[error("INVALID_INPUT: {0}")]
    BadBody(String),

    /// The controller could not produce a response.
    #[error(transparent)]
    Controller(#[from] Error),
}

impl EdgeError {
    fn status(&self) -> StatusCode {
        match self {
            EdgeError::BadTarget(_) | EdgeError::BadBody(_) => StatusCode::BAD_REQUEST,
            EdgeError::Controller(e) if e.is_network() => StatusCode::BAD_GATEWAY,
            EdgeError::Controller(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request not served");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
