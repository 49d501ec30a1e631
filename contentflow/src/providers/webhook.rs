//! Generic webhook action.

use super::ActionProvider;
use crate::context::{render_template, ExecutionContext};
use crate::errors::{ContentflowError, Result};
use crate::webhook::{WebhookConfig, WebhookDispatcher};
use async_trait::async_trait;
use std::collections::HashMap;

/// Posts to a configured webhook through the [`WebhookDispatcher`].
///
/// The action config is a [`WebhookConfig`] plus an optional
/// `payload_template`. A JSON template (a JSON object or array, or a string
/// starting with `{` or `[`) is parsed first and each string leaf is rendered,
/// so step outputs land JSON-escaped; a string that does not parse is a
/// validation error. Any other template is rendered and sent
/// as `{"content": ...}`. Without a template the whole run context is sent.
#[derive(Debug, Clone)]
pub struct WebhookActionProvider {
    dispatcher: WebhookDispatcher,
}

impl WebhookActionProvider {
    /// Provider id.
    pub const ID: &'static str = "webhook";

    /// Creates the provider.
    #[must_use]
    pub fn new(dispatcher: WebhookDispatcher) -> Self {
        Self { dispatcher }
    }

    fn payload(config: &serde_json::Value, ctx: &ExecutionContext) -> Result<serde_json::Value> {
        let template = match config.get("payload_template") {
            None | Some(serde_json::Value::Null) => return Ok(ctx.to_json()),
            Some(serde_json::Value::String(text)) => {
                let trimmed = text.trim_start();
                if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
                    return Ok(serde_json::json!({ "content": render_template(text, ctx) }));
                }
                serde_json::from_str(text).map_err(|e| {
                    ContentflowError::validation(format!("webhook payload_template is not valid JSON: {e}"))
                })?
            }
            Some(structured) => structured.clone(),
        };
        Ok(render_leaves(template, ctx))
    }
}

fn render_leaves(value: serde_json::Value, ctx: &ExecutionContext) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => serde_json::Value::String(render_template(&text, ctx)),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(|v| render_leaves(v, ctx)).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, render_leaves(v, ctx)))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl ActionProvider for WebhookActionProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        let webhook = WebhookConfig::from_value(config)?;
        let payload = Self::payload(config, ctx)?;

        let mut headers = HashMap::new();
        headers.insert(
            "X-Contentflow-Run".to_string(),
            ctx.identity().run_id.to_string(),
        );

        self.dispatcher.send(&webhook, Some(&payload), &headers).await
    }
}
