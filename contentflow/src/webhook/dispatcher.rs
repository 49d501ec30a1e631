//! Retrying webhook dispatcher.

use super::config::check_header;
use super::{RetryPolicy, WebhookConfig};
use crate::errors::{ContentflowError, Result};
use reqwest::Client;
use std::collections::HashMap;

const PROVIDER_ID: &str = "webhook";

/// Sends webhook requests, retrying transport failures with backoff.
///
/// A non-2xx response is a definitive answer from the endpoint and fails
/// immediately. Connect, timeout and request errors are retried, as is a 2xx
/// whose body cannot be read. A request that cannot be built is a
/// configuration error and never retried.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: Client,
    policy: RetryPolicy,
}

impl WebhookDispatcher {
    /// Creates a dispatcher. The policy supplies the delay schedule; the
    /// retry count always comes from the config being sent.
    #[must_use]
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the backoff policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `payload` to the configured target and returns the response body.
    ///
    /// The config is validated first; an invalid config never reaches the
    /// network.
    pub async fn send(
        &self,
        config: &WebhookConfig,
        payload: Option<&serde_json::Value>,
        headers: &HashMap<String, String>,
    ) -> Result<String> {
        config.validate()?;
        for (name, value) in headers {
            check_header(name, value)?;
        }

        let url = config.webhook_url.trim();
        let policy = self.policy.clone().with_max_retries(config.retry_attempts);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(config.http_method.into(), url)
                .timeout(config.timeout())
                .header(reqwest::header::ACCEPT, "application/json");
            for (name, value) in config.headers.iter().chain(headers.iter()) {
                request = request.header(name.as_str(), value.as_str());
            }
            if let Some((name, value)) = config.auth.header() {
                request = request.header(name, value);
            }
            if let Some(body) = payload.filter(|_| config.http_method.has_body()) {
                request = request.json(body);
            }

            tracing::debug!(url, attempt, method = ?config.http_method, "Sending webhook");

            let err = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) if status.is_success() => {
                            tracing::debug!(url, attempt, status = status.as_u16(), "Webhook delivered");
                            return Ok(body);
                        }
                        Ok(body) => {
                            tracing::warn!(url, status = status.as_u16(), "Webhook endpoint rejected the request");
                            return Err(ContentflowError::http_status(
                                PROVIDER_ID,
                                url,
                                status.as_u16(),
                                body,
                            ));
                        }
                        Err(err) if !status.is_success() => {
                            return Err(ContentflowError::http_status(
                                PROVIDER_ID,
                                url,
                                status.as_u16(),
                                format!("unreadable response body: {err}"),
                            ));
                        }
                        // 2xx whose body broke off mid-read
                        Err(err) => err,
                    }
                }
                Err(err) if err.is_builder() => {
                    return Err(ContentflowError::configuration(format!(
                        "webhook request to {url} could not be built: {err}"
                    )));
                }
                Err(err) => err,
            };

            let retries_done = attempt - 1;
            if policy.allows_retry(retries_done) {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    url,
                    attempt,
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Webhook transport failure, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::error!(url, attempts = attempt, error = %err, "Webhook failed after retries");
            return Err(ContentflowError::transport(
                url,
                attempt,
                config.retry_attempts,
                err.to_string(),
            ));
        }
    }
}
