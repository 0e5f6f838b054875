//! Mapping inbound request targets onto the upstream origin.

use url::Url;

/// Error type for upstream URL mapping failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty request target")]
    Empty,

    #[error("request target must be origin-form (start with '/'): {0}")]
    NotOriginForm(String),

    #[error("request target escapes the upstream origin: {0}")]
    ForeignOrigin(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve an origin-form request target (`/path?query`) against `upstream`.
///
/// The result always shares the upstream's scheme, host and port; targets
/// such as `//other.host/` that would resolve elsewhere are rejected.
pub fn upstream_url(upstream: &Url, target: &str) -> Result<Url, UrlError> {
    if target.is_empty() {
        return Err(UrlError::Empty);
    }
    if !target.starts_with('/') {
        return Err(UrlError::NotOriginForm(target.to_string()));
    }

    let mut resolved = upstream.join(target).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    if resolved.origin() != upstream.origin() {
        return Err(UrlError::ForeignOrigin(target.to_string()));
    }

    resolved.set_fragment(None);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> Url {
        Url::parse("http://127.0.0.1:3000").unwrap()
    }

    #[test]
    fn test_upstream_url_basic() {
        let url = upstream_url(&upstream(), "/feed").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/feed");
    }

    #[test]
    fn test_upstream_url_preserves_query() {
        let url = upstream_url(&upstream(), "/search?q=lamp&sort=new").unwrap();
        assert_eq!(url.path(), "/search");
        assert_eq!(url.query(), Some("q=lamp&sort=new"));
    }

    #[test]
    fn test_upstream_url_ignores_upstream_path() {
        let base = Url::parse("https://wishlist.example/app/").unwrap();
        let url = upstream_url(&base, "/explore").unwrap();
        assert_eq!(url.as_str(), "https://wishlist.example/explore");
    }

    #[test]
    fn test_upstream_url_rejects_scheme_relative() {
        let result = upstream_url(&upstream(), "//evil.example/steal");
        assert!(matches!(result, Err(UrlError::ForeignOrigin(_))));
    }

    #[test]
    fn test_upstream_url_rejects_absolute_form() {
        let result = upstream_url(&upstream(), "http://evil.example/");
        assert!(matches!(result, Err(UrlError::NotOriginForm(_))));
    }

    #[test]
    fn test_upstream_url_empty() {
        assert!(matches!(upstream_url(&upstream(), ""), Err(UrlError::Empty)));
    }

    #[test]
    fn test_upstream_url_normalizes_dot_segments() {
        let url = upstream_url(&upstream(), "/settings/../feed").unwrap();
        assert_eq!(url.path(), "/feed");
    }
}
