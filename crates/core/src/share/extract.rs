//! URL extraction from free-form shared text.

use std::sync::LazyLock;

use regex::Regex;

/// `http://` or `https://` followed by everything up to the next whitespace.
/// Kept byte-for-byte compatible with links shared by earlier clients.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("valid URL pattern"));

/// First URL-looking substring of `text`, if any.
pub fn extract_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}
