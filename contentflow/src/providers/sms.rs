//! Bulk SMS through a Twilio-style gateway.

use super::http::send;
use super::{config_str, require_str, ActionProvider};
use crate::context::{render_template, ExecutionContext, PREVIOUS_RESULT_PLACEHOLDER};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default gateway base URL.
pub const DEFAULT_SMS_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Sends one message per recipient.
///
/// Config: `account_sid`, `auth_token`, `from`, `recipients` (array or
/// comma-separated string), optional `message` template (defaults to the
/// previous result) and `endpoint`. Individual delivery failures are counted;
/// the call fails only when no message went out.
#[derive(Debug, Clone)]
pub struct BulkSmsProvider {
    client: Client,
    timeout: Duration,
}

impl BulkSmsProvider {
    /// Provider id.
    pub const ID: &'static str = "bulk_sms";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn recipients(config: &serde_json::Value) -> Vec<String> {
        match config.get("recipients") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(serde_json::Value::String(list)) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl ActionProvider for BulkSmsProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        let account_sid = require_str(Self::ID, config, "account_sid")?;
        let auth_token = require_str(Self::ID, config, "auth_token")?;
        let from = require_str(Self::ID, config, "from")?;
        let recipients = Self::recipients(config);
        if recipients.is_empty() {
            return Err(ContentflowError::configuration(
                "bulk_sms requires at least one recipient",
            ));
        }

        let template = config_str(config, "message").unwrap_or(PREVIOUS_RESULT_PLACEHOLDER);
        let body = render_template(template, ctx);
        if body.trim().is_empty() {
            return Err(ContentflowError::validation("SMS message is empty"));
        }

        let base = config_str(config, "endpoint")
            .unwrap_or(DEFAULT_SMS_BASE)
            .trim_end_matches('/');
        let url = format!("{base}/Accounts/{account_sid}/Messages.json");

        let mut sent = 0usize;
        let mut errors = Vec::new();
        for to in &recipients {
            let request = self
                .client
                .post(&url)
                .basic_auth(account_sid, Some(auth_token))
                .timeout(self.timeout)
                .form(&[("To", to.as_str()), ("From", from), ("Body", body.as_str())]);
            match send(Self::ID, &url, request).await {
                Ok(_) => sent += 1,
                Err(err) => {
                    tracing::warn!(recipient = %to, error = %err, "SMS delivery failed");
                    errors.push(serde_json::json!({"to": to, "error": err.to_string()}));
                }
            }
        }

        tracing::info!(sent, failed = errors.len(), "Bulk SMS finished");
        if sent == 0 {
            return Err(ContentflowError::provider(
                Self::ID,
                format!("all {} SMS deliveries failed", recipients.len()),
            ));
        }

        Ok(serde_json::json!({
            "sent": sent,
            "failed": errors.len(),
            "errors": errors,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, recipients: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "account_sid": "AC1",
            "auth_token": "secret",
            "from": "+15550000",
            "recipients": recipients,
            "endpoint": server.uri(),
        })
    }

    #[tokio::test]
    async fn test_sends_one_message_per_recipient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Accounts/AC1/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("Body=Hello"))
            .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
            .expect(2)
            .mount(&server)
            .await;

        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s", None, "Hello");
        let provider = BulkSmsProvider::new(Client::new(), Duration::from_secs(5));

        let out = provider
            .execute(&config(&server, serde_json::json!("+1555111, +1555222")), &ctx)
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["sent"], 2);
        assert_eq!(report["failed"], 0);
    }

    #[tokio::test]
    async fn test_all_failures_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s", None, "Hi");
        let provider = BulkSmsProvider::new(Client::new(), Duration::from_secs(5));

        let err = provider
            .execute(&config(&server, serde_json::json!(["+1555111"])), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ProviderError");
    }

    #[tokio::test]
    async fn test_requires_recipients() {
        let server = MockServer::start().await;
        let ctx = ExecutionContext::for_pipeline("p");
        let provider = BulkSmsProvider::new(Client::new(), Duration::from_secs(5));

        let err = provider
            .execute(&config(&server, serde_json::json!([])), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
