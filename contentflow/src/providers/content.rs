//! Content item creation from model output.

use super::{config_str, ActionProvider};
use crate::collaborators::{ContentStore, NewContentItem};
use crate::context::{render_template, ExecutionContext, PREVIOUS_RESULT_PLACEHOLDER};
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Parses `{"title": ..., "body": ...}` out of step output.
///
/// Model output is often wrapped in a fenced code block; the fence is
/// stripped before parsing. Missing or empty fields are validation errors.
pub fn parse_content_payload(output: &str) -> Result<NewContentItem> {
    let trimmed = output.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(unfenced)
        .map_err(|e| ContentflowError::validation(format!("output is not valid JSON: {e}")))?;

    let field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ContentflowError::validation(format!("output has no '{key}' field")))
    };

    Ok(NewContentItem {
        title: field("title")?,
        body: field("body")?,
    })
}

/// Creates a content item from the rendered `source` template (default: the
/// previous result) and returns the new item's id.
pub struct CreateContentProvider {
    store: Arc<dyn ContentStore>,
}

impl CreateContentProvider {
    /// Provider id.
    pub const ID: &'static str = "create_content";

    /// Creates the provider.
    #[must_use]
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for CreateContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateContentProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ActionProvider for CreateContentProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        let template = config_str(config, "source").unwrap_or(PREVIOUS_RESULT_PLACEHOLDER);
        let item = parse_content_payload(&render_template(template, ctx))?;
        let created = self.store.create_content(item).await?;
        tracing::info!(content_id = %created.id, title = %created.title, "Created content item");
        Ok(created.id)
    }
}
