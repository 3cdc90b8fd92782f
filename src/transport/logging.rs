//! Request/response logging decorator
//!
//! Every exchange goes through three steps:
//! 1. Capture the request (abort if its body cannot be copied)
//! 2. Let the delegate perform the exchange, with no lock held
//! 3. Capture the response, rebuild a fresh body for the caller, and write
//!    request + response to the sink as one entry
//!
//! Logging never changes the functional result: a response that arrived is
//! always returned, and sink failures only produce warnings.

use std::io::Write;

use futures::stream;
use reqwest::{Body, Response, ResponseBuilderExt};

use super::capture::{LogEntry, LoggedRequest, LoggedResponse};
use super::sink::LogSink;
use super::{Transport, TransportError};

/// Transport that records every exchange of its delegate to a [`LogSink`]
#[derive(Debug)]
pub struct LoggingTransport<T, W> {
    delegate: T,
    sink: LogSink<W>,
}

impl<T, W: Write> LoggingTransport<T, W> {
    /// Wrap `delegate`, writing entries to `sink`
    pub const fn new(delegate: T, sink: LogSink<W>) -> Self {
        Self { delegate, sink }
    }

    /// The sink entries are written to
    pub const fn sink(&self) -> &LogSink<W> {
        &self.sink
    }

    /// The wrapped transport
    pub const fn delegate(&self) -> &T {
        &self.delegate
    }

    fn persist(&self, entry: &LogEntry) {
        if let Err(e) = self.sink.write_entry(entry) {
            tracing::warn!(
                exchange_id = %entry.exchange_id,
                url = %entry.request.url,
                error = %e,
                "Failed to write exchange to log"
            );
        }
    }
}

impl<T, W> Transport for LoggingTransport<T, W>
where
    T: Transport,
    W: Write + Send,
{
    async fn round_trip(&self, request: reqwest::Request) -> Result<Response, TransportError> {
        let entry = LogEntry::begin(LoggedRequest::capture(&request)?);

        let response = match self.delegate.round_trip(request).await {
            Ok(response) => response,
            Err(err) => {
                self.persist(&entry);
                return Err(err);
            }
        };

        let (response, logged) = capture_response(response).await?;
        self.persist(&entry.finish(logged));
        Ok(response)
    }
}

/// Read the whole body of `response` and hand back an equivalent response
/// with a fresh body. Extensions such as the peer address carry over.
///
/// If reading the body fails part-way, the returned response replays the bytes
/// that were read and then the same error, and no capture is produced.
async fn capture_response(
    mut response: Response,
) -> Result<(Response, Option<LoggedResponse>), TransportError> {
    let status = response.status();
    let version = response.version();
    let url = response.url().clone();
    let headers = response.headers().clone();
    let extensions = std::mem::take(response.extensions_mut());

    let mut body = Vec::new();
    let read_error = loop {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break None,
            Err(e) => break Some(e),
        }
    };

    let (fresh_body, logged) = match read_error {
        None => {
            let logged = LoggedResponse::capture(status, &headers, &body);
            (Body::from(body), Some(logged))
        }
        Some(err) => {
            tracing::warn!(
                url = %url,
                status = %status,
                error = %err,
                "Failed to read response body for logging; logging request only"
            );
            let replay: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(body), Err(err)];
            (Body::wrap_stream(stream::iter(replay)), None)
        }
    };

    let mut builder = http::Response::builder().status(status).version(version);
    if let Some(map) = builder.headers_mut() {
        *map = headers;
    }
    if let Some(ext) = builder.extensions_mut() {
        *ext = extensions;
    }
    let builder = builder.url(url);
    let rebuilt = builder
        .body(fresh_body)
        .map_err(|e| TransportError::Capture(format!("failed to rebuild response: {e}")))?;

    Ok((Response::from(rebuilt), logged))
}
