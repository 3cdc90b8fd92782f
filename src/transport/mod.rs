//! HTTP transport abstraction and the request/response logging decorator
//!
//! A [`Transport`] performs exactly one HTTP exchange. [`ReqwestTransport`]
//! does the network I/O; [`LoggingTransport`] wraps any transport and writes
//! every exchange to a shared [`LogSink`] without changing what the caller
//! observes.

use std::future::Future;

use reqwest::{Client, Request, Response};
use thiserror::Error;

pub mod capture;
pub mod http_client;
pub mod logging;
pub mod sink;

#[cfg(test)]
pub(crate) mod mock;

pub use capture::{LogEntry, LoggedRequest, LoggedResponse};
pub use http_client::create_http_client;
pub use logging::LoggingTransport;
pub use sink::{LogSink, SinkError};

/// Errors produced while performing one exchange
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be captured for logging; the exchange was not attempted
    #[error("Failed to capture request for logging: {0}")]
    Capture(String),

    /// The exchange timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Any other HTTP-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl TransportError {
    /// Whether this failure may succeed when the exchange is repeated
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }

    /// Whether this failure is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Something that can perform one HTTP exchange.
///
/// Implementations may be called concurrently from many in-flight requests.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response, or the reason no response was
    /// received.
    fn round_trip(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// Transport that performs the exchange over the network with `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an already configured client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending request");
        let response = self.client.execute(request).await?;
        tracing::debug!(status = %response.status(), "Received response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(TransportError::Timeout("t".into()).is_retryable());
        assert!(TransportError::Connect("c".into()).is_retryable());
        assert!(!TransportError::Capture("x".into()).is_retryable());
    }

    #[test]
    fn test_timeout_detection() {
        assert!(TransportError::Timeout("t".into()).is_timeout());
        assert!(!TransportError::Connect("c".into()).is_timeout());
    }
}
