//! Share ingestion pipeline.
//!
//! Turns an OS share-sheet payload (`title`, `text`, `url`, all optional and
//! untrusted) into a "see other" redirect to the add-product page:
//!
//! - An explicit `url` wins. Otherwise the first `http(s)://` link found in
//!   `text` is used as the url.
//! - `text` is forwarded only when no url could be resolved.
//! - `shared=true` is always set.
//!
//! A payload that could not be read still redirects, with no prefill.

mod extract;
mod redirect;

pub use redirect::RedirectTarget;

use extract::extract_url;
use http::Method;
use redirect::with_query;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Raw share input, as submitted by the OS or typed into a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SharePayload {
    /// Collect `title`, `text` and `url` from name/value pairs. The first
    /// occurrence of a field wins; other names are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut payload = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_ref() {
                "title" => &mut payload.title,
                "text" => &mut payload.text,
                "url" => &mut payload.url,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        payload
    }

    /// Parse an `application/x-www-form-urlencoded` body or query string.
    pub fn from_urlencoded(input: &[u8]) -> Self {
        Self::from_pairs(form_urlencoded::parse(input))
    }
}

/// Why a share submission could not be read.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShareError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("unreadable submission: {0}")]
    UnreadableSubmission(String),
}

/// Canonical share parameters. `text` and `url` are never both set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedShareTarget {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub shared: bool,
}

impl NormalizedShareTarget {
    /// A share with nothing to prefill.
    pub fn empty() -> Self {
        Self { title: None, url: None, text: None, shared: true }
    }

    /// Normalize a payload.
    pub fn from_payload(payload: SharePayload) -> Self {
        let title = payload.title.unwrap_or_default();
        let text = payload.text.unwrap_or_default();
        let url = payload.url.unwrap_or_default();

        let resolved = if !url.is_empty() {
            Some(url)
        } else {
            extract_url(&text).map(str::to_string)
        };

        Self {
            title: Some(title).filter(|t| !t.is_empty()),
            text: Some(text).filter(|t| !t.is_empty() && resolved.is_none()),
            url: resolved,
            shared: true,
        }
    }

    /// Query parameters in emission order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(title) = &self.title {
            pairs.push(("title", title.as_str()));
        }
        if let Some(text) = &self.text {
            pairs.push(("text", text.as_str()));
        }
        if let Some(url) = &self.url {
            pairs.push(("url", url.as_str()));
        }
        if self.shared {
            pairs.push(("shared", "true"));
        }
        pairs
    }

    /// Redirect location under `destination`.
    pub fn location(&self, destination: &str) -> String {
        with_query(destination, self.query_pairs())
    }
}

/// Stateless share ingestion bound to a destination route.
#[derive(Debug, Clone)]
pub struct Ingestor {
    destination: String,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new("/add-product")
    }
}

impl Ingestor {
    pub fn new(destination: impl Into<String>) -> Self {
        Self { destination: destination.into() }
    }

    /// Normalize a share and build its redirect.
    ///
    /// POST submissions and GET query strings go through the same
    /// normalization. A payload that failed to parse degrades to a redirect
    /// with only `shared=true`; it is never an error.
    pub fn ingest(&self, payload: Result<SharePayload, ShareError>, method: &Method) -> RedirectTarget {
        let target = match payload {
            Ok(payload) => NormalizedShareTarget::from_payload(payload),
            Err(e) => {
                tracing::warn!(%method, error = %e, "share payload unreadable, redirecting without prefill");
                NormalizedShareTarget::empty()
            }
        };

        let location = target.location(&self.destination);
        tracing::info!(
            %method,
            has_title = target.title.is_some(),
            has_url = target.url.is_some(),
            has_text = target.text.is_some(),
            "share ingested"
        );
        RedirectTarget::see_other(location)
    }
}
