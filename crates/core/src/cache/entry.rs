//! Cached response snapshots.

use bytes::Bytes;
use http::StatusCode;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::exchange::{Request, Response};

/// An immutable snapshot of a response, stored under one request key.
///
/// Alongside the response it keeps the request-header values named by the
/// response's `Vary` header, so a later lookup can tell whether the stored
/// representation applies to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub vary: Vec<(String, Option<String>)>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Snapshot `response` as the answer to `request`. `Set-Cookie` is
    /// dropped; a replayed response never hands out a session.
    pub fn capture(request: &Request, response: &Response) -> Self {
        let vary = vary_names(&response.headers)
            .into_iter()
            .map(|name| {
                let value = request
                    .headers
                    .get(name.as_str())
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
                (name, value)
            })
            .collect();

        let mut headers = response.headers.clone();
        headers.remove(header::SET_COOKIE);

        Self {
            url: super::hash::key_url(&request.url),
            status: response.status,
            headers,
            body: response.body.clone(),
            vary,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether this snapshot may answer `request`.
    pub fn matches(&self, request: &Request) -> bool {
        self.vary.iter().all(|(name, stored)| {
            if name == "*" {
                return false;
            }
            let current = request
                .headers
                .get(name.as_str())
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            &current == stored
        })
    }

    pub fn to_response(&self) -> Response {
        Response { status: self.status, headers: self.headers.clone(), body: self.body.clone() }
    }
}

fn vary_names(headers: &HeaderMap) -> Vec<String> {
    let mut names: Vec<String> = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Flatten headers for persistence. Non-UTF-8 values are stored lossily.
pub(crate) fn headers_to_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect()
}

pub(crate) fn headers_from_pairs(pairs: Vec<(String, String)>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) else {
            continue;
        };
        headers.append(name, value);
    }
    headers
}
