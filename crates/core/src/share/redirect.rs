//! Redirect construction for normalized share targets.

use http::StatusCode;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside a query value. `:`, `/` and `?` stay readable
/// so shared links remain legible in the location.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A "see other" redirect produced by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub status: StatusCode,
    pub location: String,
}

impl RedirectTarget {
    pub fn see_other(location: String) -> Self {
        Self { status: StatusCode::SEE_OTHER, location }
    }
}

/// Append `pairs` to `path` as an encoded query string.
pub fn with_query<'a>(path: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut location = path.to_string();
    for (i, (name, value)) in pairs.into_iter().enumerate() {
        location.push(if i == 0 { '?' } else { '&' });
        location.push_str(name);
        location.push('=');
        location.extend(utf8_percent_encode(value, QUERY_VALUE));
    }
    location
}
