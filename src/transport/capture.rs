//! Capturing requests and responses as log entries
//!
//! A captured body is stored as `parsedBody` when it holds exactly one JSON
//! value, and as base64 `rawBody` otherwise. Credentials in headers are
//! redacted; everything else is written as received.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, AUTHORIZATION, PROXY_AUTHORIZATION};
use reqwest::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::TransportError;

/// Placeholder written instead of credential header values
pub const REDACTED: &str = "<redacted>";

/// Headers as written to the log: name -> values in arrival order
pub type LoggedHeaders = BTreeMap<String, Vec<String>>;

/// One exchange: the request, followed by its response if one was received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Time-ordered identifier of the exchange
    pub exchange_id: String,
    /// When the request was captured (RFC 3339, UTC)
    pub timestamp: String,
    /// The outgoing request
    pub request: LoggedRequest,
    /// The response, or `None` if the exchange failed before one arrived
    pub response: Option<LoggedResponse>,
}

impl LogEntry {
    /// Start an entry for a captured request
    #[must_use]
    pub fn begin(request: LoggedRequest) -> Self {
        Self {
            exchange_id: new_exchange_id(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            request,
            response: None,
        }
    }

    /// Complete the entry with the response, if any
    #[must_use]
    pub fn finish(mut self, response: Option<LoggedResponse>) -> Self {
        self.response = response;
        self
    }

    /// Parse the timestamp back into a date
    #[must_use]
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Captured form of an outgoing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedRequest {
    /// HTTP method
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: LoggedHeaders,
    /// Body, if it was a single JSON value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_body: Option<Value>,
    /// Body, if it was anything else
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "raw_body"
    )]
    pub raw_body: Option<Vec<u8>>,
}

impl LoggedRequest {
    /// Capture `request` without consuming its body.
    ///
    /// # Errors
    ///
    /// Fails when the body is a stream, since reading it here would leave
    /// nothing for the real exchange.
    pub fn capture(request: &Request) -> Result<Self, TransportError> {
        let (parsed_body, raw_body) = match request.body() {
            None => (None, None),
            Some(body) => {
                let bytes = body.as_bytes().ok_or_else(|| {
                    TransportError::Capture(format!(
                        "body of {} {} is a stream and cannot be copied",
                        request.method(),
                        request.url()
                    ))
                })?;
                classify_body(bytes)
            }
        };

        Ok(Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            headers: capture_headers(request.headers()),
            parsed_body,
            raw_body,
        })
    }
}

/// Captured form of an incoming response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: LoggedHeaders,
    /// Body, if it was a single JSON value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_body: Option<Value>,
    /// Body, if it was anything else
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "raw_body"
    )]
    pub raw_body: Option<Vec<u8>>,
}

impl LoggedResponse {
    /// Capture a response from its parts and fully-read body
    #[must_use]
    pub fn capture(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Self {
        let (parsed_body, raw_body) = classify_body(body);
        Self {
            status_code: status.as_u16(),
            headers: capture_headers(headers),
            parsed_body,
            raw_body,
        }
    }
}

/// Split a body into (parsed, raw). Exactly one is set for a non-empty body.
#[must_use]
pub fn classify_body(bytes: &[u8]) -> (Option<Value>, Option<Vec<u8>>) {
    if bytes.is_empty() {
        return (None, None);
    }

    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<Value>();
    match (values.next(), values.next()) {
        // Exactly one JSON value, trailing whitespace only
        (Some(Ok(value)), None) => (Some(value), None),
        _ => (None, Some(bytes.to_vec())),
    }
}

fn capture_headers(headers: &HeaderMap) -> LoggedHeaders {
    let mut logged = LoggedHeaders::new();
    for (name, value) in headers {
        let value = if name == AUTHORIZATION || name == PROXY_AUTHORIZATION {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        logged.entry(name.as_str().to_string()).or_default().push(value);
    }
    logged
}

fn new_exchange_id() -> String {
    Uuid::now_v7().to_string()
}

/// Serde helpers writing raw bodies as standard base64
mod raw_body {
    use base64::{engine::general_purpose::STANDARD as B64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // signature dictated by serde's `with`
    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => s.serialize_str(&B64.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|encoded| B64.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
