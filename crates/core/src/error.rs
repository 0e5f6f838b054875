//! Unified error types for wishlist-edge.

use tokio_rusqlite::rusqlite;

use crate::lifecycle::{Event, Lifecycle};
use crate::network::NetworkError;

/// Unified error types for the edge cache layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a malformed shell route).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The network call failed and no cached entry could stand in for it.
    #[error("NETWORK_ERROR: {0}")]
    Network(#[from] NetworkError),

    /// A shell route could not be primed during install.
    #[error("INSTALL_FAILED: {route}: {reason}")]
    InstallFailed { route: String, reason: String },

    /// The lifecycle event is not valid in the current state.
    #[error("INVALID_TRANSITION: {event:?} while {state:?}")]
    InvalidTransition { event: Event, state: Lifecycle },

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl Error {
    /// Whether the cache fallback path applies to this error.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed { route: "/feed".to_string(), reason: "status 503".to_string() };
        assert!(err.to_string().contains("INSTALL_FAILED"));
        assert!(err.to_string().contains("/feed"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition { event: Event::Activate, state: Lifecycle::Parsed };
        assert_eq!(err.to_string(), "INVALID_TRANSITION: Activate while Parsed");
    }

    #[test]
    fn test_network_error_is_network() {
        let err: Error = NetworkError::Offline("unreachable".to_string()).into();
        assert!(err.is_network());
        assert!(!Error::InvalidInput("x".to_string()).is_network());
    }
}
