//! Share target entry points.
//!
//! Both methods funnel into [`Ingestor::ingest`](wishlist_edge_core::Ingestor::ingest).
//! Every encoding keeps the first value of a repeated field. A submission that
//! cannot be read is passed on as a [`ShareError`] and still ends in a redirect.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, RawForm, RawQuery, Request, State};
use axum::http::{Method, header};
use axum::response::{IntoResponse, Response};
use wishlist_edge_core::{RedirectTarget, ShareError, SharePayload};

use crate::state::AppState;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM: &str = "multipart/form-data";

pub async fn share_get(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let payload = SharePayload::from_urlencoded(query.unwrap_or_default().as_bytes());
    see_other(state.ingestor.ingest(Ok(payload), &Method::GET))
}

pub async fn share_post(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let payload = read_submission(request).await;
    see_other(state.ingestor.ingest(payload, &Method::POST))
}

fn see_other(target: RedirectTarget) -> Response {
    (target.status, [(header::LOCATION, target.location)]).into_response()
}

fn unreadable(err: impl Display) -> ShareError {
    ShareError::UnreadableSubmission(err.to_string())
}

async fn read_submission(request: Request) -> Result<SharePayload, ShareError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with(FORM_URLENCODED) {
        let RawForm(body) = RawForm::from_request(request, &()).await.map_err(unreadable)?;
        Ok(SharePayload::from_urlencoded(&body))
    } else if content_type.starts_with(MULTIPART_FORM) {
        let multipart = Multipart::from_request(request, &()).await.map_err(unreadable)?;
        read_multipart(multipart).await
    } else {
        Err(ShareError::UnsupportedContentType(content_type))
    }
}

/// Read the text of the share fields; other names are skipped.
async fn read_multipart(mut multipart: Multipart) -> Result<SharePayload, ShareError> {
    let mut pairs = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let Some(name) = field.name().filter(|n| matches!(*n, "title" | "text" | "url")).map(str::to_string) else {
            continue;
        };
        pairs.push((name, field.text().await.map_err(unreadable)?));
    }

    Ok(SharePayload::from_pairs(pairs))
}
