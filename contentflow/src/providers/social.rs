//! Status posting to a Mastodon-compatible instance.

use super::http::{json_str, send_json};
use super::{config_str, require_str, ActionProvider};
use crate::context::{render_template, ExecutionContext, PREVIOUS_RESULT_PLACEHOLDER};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_MAX_LENGTH: usize = 500;

/// Publishes the rendered `message` (default: previous result) as a status.
///
/// Returns the URL of the created status.
#[derive(Debug, Clone)]
pub struct SocialPostProvider {
    client: Client,
    timeout: Duration,
}

impl SocialPostProvider {
    /// Provider id.
    pub const ID: &'static str = "social_post";

    /// Creates the provider.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[async_trait]
impl ActionProvider for SocialPostProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        let instance = require_str(Self::ID, config, "instance_url")?.trim_end_matches('/');
        let token = require_str(Self::ID, config, "access_token")?;
        let visibility = config_str(config, "visibility").unwrap_or("public");
        let max_length = config
            .get("max_length")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_LENGTH);

        let template = config_str(config, "message").unwrap_or(PREVIOUS_RESULT_PLACEHOLDER);
        let status = render_template(template, ctx);
        if status.trim().is_empty() {
            return Err(ContentflowError::validation("status text is empty"));
        }
        let status = truncate_chars(status.trim(), max_length);

        let url = format!("{instance}/api/v1/statuses");
        let request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&serde_json::json!({"status": status, "visibility": visibility}));
        let response = send_json(Self::ID, &url, request).await?;

        let posted = json_str(Self::ID, &response, "/url")
            .or_else(|_| json_str(Self::ID, &response, "/id"))?;
        tracing::info!(url = posted, "Posted status");
        Ok(posted.to_string())
    }
}
