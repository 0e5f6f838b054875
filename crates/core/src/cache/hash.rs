//! Request key generation.

use http::header;
use sha2::{Digest, Sha256};
use url::Url;

use crate::exchange::Request;

/// Compute the cache key for a method and URL.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of the credentials a request carries, if any.
///
/// Entries for credentialed requests live under this scope so one user's
/// responses are never found by another user's lookup.
pub fn credential_scope(request: &Request) -> Option<String> {
    if !request.is_credentialed() {
        return None;
    }
    let mut hasher = Sha256::new();
    for name in [header::COOKIE, header::AUTHORIZATION] {
        hasher.update(name.as_str().as_bytes());
        for value in request.headers.get_all(&name) {
            hasher.update(b"\n");
            hasher.update(value.as_bytes());
        }
        hasher.update(b"\0");
    }
    Some(hex::encode(hasher.finalize()))
}

/// URL as stored in a key: fragments never reach the server, so they never
/// distinguish two entries.
pub fn key_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// Identity of a cacheable request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    hash: String,
    url: String,
    scoped: bool,
}

impl RequestKey {
    /// Derive the key for a request. Only GET requests have one.
    ///
    /// A credentialed request gets a key private to its credentials.
    pub fn for_request(request: &Request) -> Option<Self> {
        let public = Self::public(request)?;
        match credential_scope(request) {
            Some(scope) => Some(Self {
                hash: compute_cache_key(&public.hash, &scope),
                url: public.url,
                scoped: true,
            }),
            None => Some(public),
        }
    }

    /// The key shared by every anonymous request for the same URL.
    pub fn public(request: &Request) -> Option<Self> {
        if !request.is_get() {
            return None;
        }
        let url = key_url(&request.url);
        Some(Self { hash: compute_cache_key(request.method.as_str(), &url), url, scoped: false })
    }

    /// Whether this key is private to one set of credentials.
    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
