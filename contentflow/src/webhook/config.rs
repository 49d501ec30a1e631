//! Webhook target configuration.

use crate::errors::{ContentflowError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Accepted timeout range, in seconds.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

/// Accepted retry range.
pub const RETRY_RANGE: std::ops::RangeInclusive<u32> = 0..=5;

/// HTTP method of a webhook call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    #[default]
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Whether the method carries a request body.
    #[must_use]
    pub fn has_body(self) -> bool {
        !matches!(self, Self::Get | Self::Delete)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// Authentication attached to a webhook call.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookAuth {
    /// No authentication.
    #[default]
    None,
    /// HTTP basic auth.
    Basic {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Bearer token.
    Bearer {
        /// Token.
        token: String,
    },
    /// A single custom header.
    Custom {
        /// Header name.
        header: String,
        /// Header value.
        value: String,
    },
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Self::Bearer { .. } => f.write_str("Bearer(***)"),
            Self::Custom { header, .. } => write!(f, "Custom({header}: ***)"),
        }
    }
}

impl WebhookAuth {
    /// Returns the header this auth contributes, if any.
    #[must_use]
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            Self::None => None,
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Some(("Authorization".to_string(), format!("Basic {encoded}")))
            }
            Self::Bearer { token } => {
                Some(("Authorization".to_string(), format!("Bearer {token}")))
            }
            Self::Custom { header, value } => Some((header.clone(), value.clone())),
        }
    }
}

/// Checks that a header name and value can go on the wire.
pub(crate) fn check_header(name: &str, value: &str) -> Result<()> {
    reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        ContentflowError::configuration(format!("invalid webhook header name '{name}': {e}"))
    })?;
    reqwest::header::HeaderValue::from_str(value).map_err(|e| {
        ContentflowError::configuration(format!("invalid value for webhook header '{name}': {e}"))
    })?;
    Ok(())
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

/// Configuration of one webhook target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Target URL.
    pub webhook_url: String,
    /// HTTP method.
    #[serde(default)]
    pub http_method: HttpMethod,
    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Retries after a transport failure.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Extra request headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Authentication.
    #[serde(default)]
    pub auth: WebhookAuth,
}

impl WebhookConfig {
    /// Creates a POST config with default timeout and retries.
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            http_method: HttpMethod::default(),
            timeout_seconds: default_timeout_seconds(),
            retry_attempts: default_retry_attempts(),
            headers: HashMap::new(),
            auth: WebhookAuth::None,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.http_method = method;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the retry count.
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the authentication.
    #[must_use]
    pub fn with_auth(mut self, auth: WebhookAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Parses a config from a JSON value and validates it.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone()).map_err(|e| {
            ContentflowError::configuration(format!("invalid webhook configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the URL, timeout, retry count and headers.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(self.webhook_url.trim()).map_err(|e| {
            ContentflowError::configuration(format!(
                "invalid webhook URL '{}': {e}",
                self.webhook_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContentflowError::configuration(format!(
                "webhook URL '{}' must use http or https",
                self.webhook_url
            )));
        }
        if url.host_str().is_none() {
            return Err(ContentflowError::configuration(format!(
                "webhook URL '{}' has no host",
                self.webhook_url
            )));
        }
        if !TIMEOUT_RANGE.contains(&self.timeout_seconds) {
            return Err(ContentflowError::configuration(format!(
                "webhook timeout must be between 1 and 300 seconds, got {}",
                self.timeout_seconds
            )));
        }
        if !RETRY_RANGE.contains(&self.retry_attempts) {
            return Err(ContentflowError::configuration(format!(
                "webhook retry attempts must be between 0 and 5, got {}",
                self.retry_attempts
            )));
        }
        for (name, value) in &self.headers {
            check_header(name, value)?;
        }
        if let Some((name, value)) = self.auth.header() {
            check_header(&name, &value)?;
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_json() {
        let config =
            WebhookConfig::from_value(&serde_json::json!({"webhook_url": "https://hooks.example/a"}))
                .unwrap();
        assert_eq!(config.http_method, HttpMethod::Post);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.auth, WebhookAuth::None);
    }

    #[test]
    fn test_rejects_invalid_urls() {
        for url in ["not a url", "ftp://files.example/x", "", "mailto:a@b.c"] {
            let err = WebhookConfig::new(url).validate().unwrap_err();
            assert_eq!(err.kind(), "ConfigurationError", "url {url:?}");
        }
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(WebhookConfig::new("http://x.test").with_timeout_seconds(0).validate().is_err());
        assert!(WebhookConfig::new("http://x.test").with_timeout_seconds(301).validate().is_err());
        assert!(WebhookConfig::new("http://x.test").with_retry_attempts(6).validate().is_err());
        assert!(WebhookConfig::new("http://x.test").with_retry_attempts(5).validate().is_ok());
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = WebhookAuth::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(
            auth.header(),
            Some(("Authorization".to_string(), "Basic dXNlcjpwYXNz".to_string()))
        );
    }

    #[test]
    fn test_bearer_and_custom_headers() {
        let bearer = WebhookAuth::Bearer { token: "t0k".to_string() };
        assert_eq!(bearer.header().unwrap().1, "Bearer t0k");

        let custom = WebhookAuth::Custom {
            header: "X-Api-Key".to_string(),
            value: "secret".to_string(),
        };
        assert_eq!(
            custom.header(),
            Some(("X-Api-Key".to_string(), "secret".to_string()))
        );
        assert!(WebhookAuth::None.header().is_none());
    }

    #[test]
    fn test_auth_from_tagged_json() {
        let config = WebhookConfig::from_value(&serde_json::json!({
            "webhook_url": "https://hooks.example/a",
            "http_method": "PUT",
            "auth": {"type": "bearer", "token": "abc"}
        }))
        .unwrap();
        assert_eq!(config.http_method, HttpMethod::Put);
        assert_eq!(config.auth, WebhookAuth::Bearer { token: "abc".to_string() });
    }

    #[test]
    fn test_rejects_headers_that_cannot_be_sent() {
        let bad_name = WebhookConfig::new("http://x.test").with_header("Bad Header", "1");
        assert_eq!(bad_name.validate().unwrap_err().kind(), "ConfigurationError");

        let bad_value = WebhookConfig::new("http://x.test").with_header("X-Note", "line\nbreak");
        assert_eq!(bad_value.validate().unwrap_err().kind(), "ConfigurationError");

        let bad_auth = WebhookConfig::new("http://x.test").with_auth(WebhookAuth::Custom {
            header: "Bad Header".to_string(),
            value: "secret".to_string(),
        });
        assert_eq!(bad_auth.validate().unwrap_err().kind(), "ConfigurationError");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = WebhookAuth::Bearer { token: "very-secret".to_string() };
        assert!(!format!("{auth:?}").contains("very-secret"));
    }
}
