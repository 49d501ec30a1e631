//! HTTP plumbing shared by the concrete providers.

use crate::errors::{ContentflowError, Result};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Builds a client with a default timeout and user agent.
pub(crate) fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| ContentflowError::Internal(format!("Failed to create HTTP client: {e}")))
}

/// Sends a request once.
///
/// Network failures become `Transport` errors, non-2xx responses become
/// `Provider` errors carrying the status and body.
pub(crate) async fn send(provider: &str, url: &str, request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ContentflowError::transport(url, 1, 0, e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider, url, status = status.as_u16(), "Provider returned an error status");
    Err(ContentflowError::http_status(provider, url, status.as_u16(), body))
}

/// Sends a request and parses the body as JSON.
pub(crate) async fn send_json(
    provider: &str,
    url: &str,
    request: RequestBuilder,
) -> Result<serde_json::Value> {
    send(provider, url, request)
        .await?
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ContentflowError::provider(provider, format!("unexpected response body: {e}")))
}

/// Sends a request and returns the raw body bytes.
pub(crate) async fn send_bytes(provider: &str, url: &str, request: RequestBuilder) -> Result<Vec<u8>> {
    let bytes = send(provider, url, request)
        .await?
        .bytes()
        .await
        .map_err(|e| ContentflowError::transport(url, 1, 0, e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Reads a string at a JSON pointer or fails with a provider error.
pub(crate) fn json_str<'a>(
    provider: &str,
    body: &'a serde_json::Value,
    pointer: &str,
) -> Result<&'a str> {
    body.pointer(pointer).and_then(|v| v.as_str()).ok_or_else(|| {
        ContentflowError::provider(provider, format!("response is missing '{pointer}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": {"b": "c"}})))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5), "test").unwrap();
        let url = format!("{}/ok", server.uri());
        let body = send_json("test", &url, client.get(&url)).await.unwrap();

        assert_eq!(json_str("test", &body, "/a/b").unwrap(), "c");
        assert!(json_str("test", &body, "/a/x").is_err());
    }

    #[tokio::test]
    async fn test_send_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5), "test").unwrap();
        let url = format!("{}/x", server.uri());
        let err = send("test", &url, client.get(&url)).await.unwrap_err();

        match err {
            ContentflowError::Provider { status, message, .. } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
