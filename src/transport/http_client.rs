use reqwest::Client;
use std::time::Duration;

use super::TransportError;

/// Create the HTTP client used for all Content API calls
/// Features:
/// - Connection pooling (reuse connections across sequential calls)
/// - Separate connect timeout so an unreachable endpoint fails fast
/// - Keep-alive (maintain connections for 90 seconds)
/// - Fixed user agent identifying the samples
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., invalid configuration).
pub fn create_http_client(
    user_agent: &str,
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, TransportError> {
    Client::builder()
        .user_agent(user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()
        .map_err(TransportError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        let client = create_http_client(
            "Content API for Shopping Samples",
            Duration::from_secs(300),
            Duration::from_secs(10),
        );
        assert!(client.is_ok());
    }
}
