//! Owned request and response values exchanged with the network and the cache.
//!
//! Bodies are read into a [`Bytes`] buffer exactly once. Duplicating a
//! response for the cache is then a cheap clone of that buffer instead of a
//! second read of the body.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use url::Url;

/// An outbound request as seen by the controller.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether the request identifies a user (`Cookie` or `Authorization`).
    pub fn is_credentialed(&self) -> bool {
        self.headers.contains_key(header::COOKIE) || self.headers.contains_key(header::AUTHORIZATION)
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// 2xx, the bar a shell route must clear to be primed.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the response may be written into a cache generation.
    ///
    /// Partial content, redirects and `Cache-Control: no-store` responses are
    /// relayed but never stored.
    pub fn is_storable(&self) -> bool {
        self.status != StatusCode::PARTIAL_CONTENT && !self.status.is_redirection() && !self.has_directive("no-store")
    }

    /// Whether the response belongs to one user: it sets a cookie or is
    /// marked `Cache-Control: private`.
    pub fn is_private(&self) -> bool {
        self.headers.contains_key(header::SET_COOKIE) || self.has_directive("private")
    }

    fn has_directive(&self, directive: &str) -> bool {
        self.headers
            .get_all(header::CACHE_CONTROL)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|d| {
                let name = d.split('=').next().unwrap_or_default().trim();
                name.eq_ignore_ascii_case(directive)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_get() {
        let url = Url::parse("https://example.com/feed").unwrap();
        assert!(Request::get(url.clone()).is_get());
        assert!(!Request::new(Method::POST, url).is_get());
    }

    #[test]
    fn test_response_storable() {
        assert!(Response::new(StatusCode::OK, "ok").is_storable());
        assert!(Response::new(StatusCode::INTERNAL_SERVER_ERROR, "").is_storable());
        assert!(!Response::new(StatusCode::PARTIAL_CONTENT, "").is_storable());
        assert!(!Response::new(StatusCode::SEE_OTHER, "").is_storable());
        assert!(!Response::new(StatusCode::MOVED_PERMANENTLY, "").is_storable());
    }

    #[test]
    fn test_response_no_store_not_storable() {
        let response = Response::new(StatusCode::OK, "")
            .with_header(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0, No-Store"));
        assert!(!response.is_storable());
    }

    #[test]
    fn test_response_private() {
        assert!(!Response::new(StatusCode::OK, "").is_private());

        let cookie = Response::new(StatusCode::OK, "")
            .with_header(header::SET_COOKIE, HeaderValue::from_static("session=1"));
        assert!(cookie.is_private());

        let private = Response::new(StatusCode::OK, "")
            .with_header(header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=60"));
        assert!(private.is_private());
        assert!(private.is_storable());

        let public = Response::new(StatusCode::OK, "")
            .with_header(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=60"));
        assert!(!public.is_private());
    }

    #[test]
    fn test_request_credentialed() {
        let url = Url::parse("https://example.com/settings").unwrap();
        assert!(!Request::get(url.clone()).is_credentialed());
        assert!(
            Request::get(url.clone())
                .with_header(header::COOKIE, HeaderValue::from_static("session=a"))
                .is_credentialed()
        );
        assert!(
            Request::get(url)
                .with_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"))
                .is_credentialed()
        );
    }

    #[test]
    fn test_response_is_ok() {
        assert!(Response::new(StatusCode::NO_CONTENT, "").is_ok());
        assert!(!Response::new(StatusCode::NOT_FOUND, "").is_ok());
    }
}
