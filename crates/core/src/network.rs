//! The host's request/response fetch primitive.

use async_trait::async_trait;

use crate::exchange::{Request, Response};

/// Transport-level failures. A response with any status code, even a 5xx,
/// is a successful network call and never produces one of these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// The request did not complete within the transport's own deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The upstream could not be reached (DNS, refused connection, offline).
    #[error("offline: {0}")]
    Offline(String),

    /// Any other transport failure, including a body that could not be read.
    #[error("transport: {0}")]
    Transport(String),
}

/// Issues a request over the network.
///
/// Implementations must read the whole response body before returning so the
/// controller can hold it as an owned buffer.
#[async_trait]
pub trait Network: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, NetworkError>;
}
