//! Scripted in-process transport for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Request, Response, StatusCode};

use super::{Transport, TransportError};

/// What the mock does for one call
pub enum Reply {
    /// Return this response
    Response(Response),
    /// Fail with this error
    Error(TransportError),
}

/// Transport that replays scripted replies in order, or echoes the request
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    calls: AtomicUsize,
    echo: bool,
}

/// What the mock saw for one call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl MockTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            echo: false,
        }
    }

    /// Answer every request with `{"url": <request url>}` after a short,
    /// url-dependent delay so concurrent exchanges finish out of order
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for MockTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let recorded = record(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(recorded);
        }

        if self.echo {
            let delay = (request.url().as_str().len() + n * 7) % 5;
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            let body = serde_json::json!({ "url": request.url().as_str() }).to_string();
            return Ok(json_response(StatusCode::OK, &body));
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(err)) => Err(err),
            None => Err(TransportError::Connect(format!(
                "no scripted reply for {}",
                request.url()
            ))),
        }
    }
}

fn record(request: &Request) -> RecordedRequest {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RecordedRequest {
        method: request.method().to_string(),
        url: request.url().to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(<[u8]>::to_vec),
    }
}

/// A JSON response with `status` and `body`
pub fn json_response(status: StatusCode, body: &str) -> Response {
    let response = http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(body.to_string())
        .unwrap_or_else(|_| http::Response::new(String::new()));
    Response::from(response)
}
