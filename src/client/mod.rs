//! Content API client
//!
//! Builds authenticated JSON requests relative to the API base URL and sends
//! them through any [`Transport`], so the same client works with or without
//! exchange logging.

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Method, Request, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CliError, Result};
use crate::transport::Transport;

pub mod pages;
pub mod types;

pub use pages::Page;
pub use types::{AccountIdentifier, AuthInfo};

use types::ErrorEnvelope;

/// Placeholder in resource paths replaced with the configured merchant ID
pub const MERCHANT_ID_PLACEHOLDER: &str = "{merchantId}";

/// Client for one API base URL
#[derive(Debug)]
pub struct ContentClient<T> {
    transport: T,
    base_url: Url,
    token: Option<String>,
    merchant_id: Option<u64>,
}

impl<T: Transport> ContentClient<T> {
    /// Create a client sending requests through `transport`
    ///
    /// `base_url` should end with `/` so relative paths resolve beneath it.
    pub const fn new(transport: T, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            token: None,
            merchant_id: None,
        }
    }

    /// Attach a bearer token to every request
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Set the merchant ID substituted into `{merchantId}`
    pub fn set_merchant_id(&mut self, merchant_id: u64) {
        self.merchant_id = Some(merchant_id);
    }

    /// The merchant ID substituted into `{merchantId}`, if known
    pub const fn merchant_id(&self) -> Option<u64> {
        self.merchant_id
    }

    /// The API base URL
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve `path` against the base URL, substituting `{merchantId}`
    ///
    /// # Errors
    ///
    /// Fails if the path needs a merchant ID that is not known yet, or the
    /// base URL cannot take a path.
    ///
    /// Each `/`-separated segment is percent-encoded, so IDs such as
    /// `online:en:US:book#1` stay in the path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let path = if path.contains(MERCHANT_ID_PLACEHOLDER) {
            let id = self.merchant_id.ok_or_else(|| {
                CliError::MissingArgument(format!(
                    "merchant ID is required to resolve {path}"
                ))
            })?;
            path.replace(MERCHANT_ID_PLACEHOLDER, &id.to_string())
        } else {
            path.to_string()
        };

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                CliError::InvalidArgument(format!("cannot resolve {path} against {}", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    /// GET a resource
    ///
    /// # Errors
    ///
    /// Returns transport failures, API errors and decoding failures.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.resolve(path)?;
        self.execute_json(Method::GET, url, None).await
    }

    /// POST a new resource
    ///
    /// # Errors
    ///
    /// Returns transport failures, API errors and decoding failures.
    pub async fn insert<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_body(Method::POST, path, body).await
    }

    /// PUT a full replacement of a resource
    ///
    /// # Errors
    ///
    /// Returns transport failures, API errors and decoding failures.
    pub async fn update<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_body(Method::PUT, path, body).await
    }

    /// PATCH selected fields of a resource
    ///
    /// # Errors
    ///
    /// Returns transport failures, API errors and decoding failures.
    pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_body(Method::PATCH, path, body).await
    }

    /// DELETE a resource
    ///
    /// # Errors
    ///
    /// Returns transport failures and API errors.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.resolve(path)?;
        let request = self.build_request(Method::DELETE, url, None)?;
        self.send(request).await?;
        Ok(())
    }

    /// Which Merchant Center accounts the authenticated user can access
    ///
    /// # Errors
    ///
    /// Returns transport failures, API errors and decoding failures.
    pub async fn authinfo(&self) -> Result<AuthInfo> {
        self.get("accounts/authinfo").await
    }

    async fn send_body<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let body = serde_json::to_vec(body).map_err(|e| CliError::SerializationError(e.to_string()))?;
        self.execute_json(method, url, Some(body)).await
    }

    pub(crate) async fn execute_json<R: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<R> {
        let request = self.build_request(method, url, body)?;
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CliError::InvalidResponse(format!("failed to read body: {e}")))?;

        // Some calls (e.g. custombatch without entries) answer with no body
        let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| CliError::InvalidResponse(e.to_string()))
    }

    fn build_request(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<Request> {
        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| CliError::AuthFailed(format!("token is not a valid header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(body) = body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(Body::from(body));
        }
        Ok(request)
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let response = self.transport.round_trip(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|envelope| envelope.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(text);
        Err(CliError::ApiError { status, message })
    }
}

/// Short human-readable label for a resource: its ID plus title or name
#[must_use]
pub fn describe_resource(resource: &Value) -> String {
    let id = match &resource["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    let label = ["title", "name", "displayName"]
        .iter()
        .find_map(|key| resource[*key].as_str());

    match (id.is_empty(), label) {
        (false, Some(label)) => format!("{id}: {label}"),
        (false, None) => id,
        (true, Some(label)) => label.to_string(),
        (true, None) => resource.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::mock::{json_response, MockTransport, Reply};
    use crate::transport::TransportError;
    use reqwest::StatusCode;
    use serde_json::json;

    const BASE: &str = "https://example.test/content/v2.1/";

    fn client(replies: Vec<Reply>) -> ContentClient<MockTransport> {
        ContentClient::new(MockTransport::new(replies), Url::parse(BASE).unwrap())
            .with_token(Some("ya29.token".to_string()))
    }

    #[test]
    fn test_resolve_substitutes_merchant_id() {
        let mut client = client(Vec::new());
        assert!(matches!(
            client.resolve("{merchantId}/products"),
            Err(CliError::MissingArgument(_))
        ));

        client.set_merchant_id(42);
        assert_eq!(
            client.resolve("/{merchantId}/orders/7").unwrap().as_str(),
            "https://example.test/content/v2.1/42/orders/7"
        );
        assert_eq!(
            client.resolve("accounts/authinfo").unwrap().as_str(),
            "https://example.test/content/v2.1/accounts/authinfo"
        );
    }

    #[test]
    fn test_resolve_encodes_reserved_characters() {
        let mut client = client(Vec::new());
        client.set_merchant_id(1);
        assert_eq!(
            client.resolve("{merchantId}/products/online:en:US:book?a=1%2").unwrap().as_str(),
            "https://example.test/content/v2.1/1/products/online:en:US:book%3Fa=1%252"
        );
    }

    #[tokio::test]
    async fn test_delete_keeps_hash_in_product_id() {
        let mut client = client(vec![Reply::Response(json_response(StatusCode::NO_CONTENT, ""))]);
        client.set_merchant_id(1);
        client
            .delete("{merchantId}/products/online:en:US:book#test42")
            .await
            .unwrap();
        assert_eq!(
            client.transport().requests()[0].url,
            "https://example.test/content/v2.1/1/products/online:en:US:book%23test42"
        );
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mut client = client(vec![Reply::Response(json_response(
            StatusCode::OK,
            r#"{"id":"42"}"#,
        ))]);
        client.set_merchant_id(1);

        let order: Value = client.get("{merchantId}/orders/42").await.unwrap();
        assert_eq!(order, json!({"id": "42"}));

        let sent = &client.transport().requests()[0];
        assert_eq!(sent.method, "GET");
        assert_eq!(sent.authorization.as_deref(), Some("Bearer ya29.token"));
        assert!(sent.body.is_none());
    }

    #[tokio::test]
    async fn test_insert_posts_json_body() {
        let mut client = client(vec![Reply::Response(json_response(
            StatusCode::OK,
            r#"{"id":"online:en:US:book#1"}"#,
        ))]);
        client.set_merchant_id(1);

        let created: Value = client
            .insert("{merchantId}/products", &json!({"offerId": "book#1"}))
            .await
            .unwrap();
        assert_eq!(created["id"], "online:en:US:book#1");

        let sent = &client.transport().requests()[0];
        assert_eq!(sent.method, "POST");
        assert_eq!(sent.content_type.as_deref(), Some("application/json"));
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"offerId": "book#1"}));
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let mut client = client(vec![Reply::Response(json_response(StatusCode::NO_CONTENT, ""))]);
        client.set_merchant_id(1);
        client.delete("{merchantId}/products/abc").await.unwrap();
        assert_eq!(client.transport().requests()[0].method, "DELETE");
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let client = client(vec![Reply::Response(json_response(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"item not found"}}"#,
        ))]);

        let err = client.get::<Value>("accounts/authinfo").await.unwrap_err();
        assert!(matches!(
            err,
            CliError::ApiError { status: 404, ref message } if message == "item not found"
        ));
    }

    #[tokio::test]
    async fn test_non_json_error_keeps_raw_text() {
        let client = client(vec![Reply::Response(json_response(
            StatusCode::BAD_GATEWAY,
            "upstream unavailable",
        ))]);

        let err = client.get::<Value>("accounts/authinfo").await.unwrap_err();
        assert!(matches!(
            err,
            CliError::ApiError { status: 502, ref message } if message == "upstream unavailable"
        ));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let client = client(vec![Reply::Error(TransportError::Timeout("slow".into()))]);
        let err = client.get::<Value>("accounts/authinfo").await.unwrap_err();
        assert!(matches!(err, CliError::Transport(TransportError::Timeout(_))));
    }

    #[test]
    fn test_describe_resource() {
        assert_eq!(
            describe_resource(&json!({"id": "online:en:US:1", "title": "Book"})),
            "online:en:US:1: Book"
        );
        assert_eq!(describe_resource(&json!({"id": 7})), "7");
        assert_eq!(describe_resource(&json!({"name": "Main"})), "Main");
        assert_eq!(describe_resource(&json!({"x": 1})), r#"{"x":1}"#);
    }
}
