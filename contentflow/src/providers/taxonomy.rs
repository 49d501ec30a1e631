//! Taxonomy term listing.

use super::{require_str, ActionProvider};
use crate::collaborators::TaxonomySource;
use crate::context::ExecutionContext;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Lists the terms of a vocabulary, joined by `separator` (default `", "`).
///
/// Useful for feeding allowed categories into a later prompt.
pub struct TaxonomyActionProvider {
    source: Arc<dyn TaxonomySource>,
}

impl TaxonomyActionProvider {
    /// Provider id.
    pub const ID: &'static str = "taxonomy";

    /// Creates the provider.
    #[must_use]
    pub fn new(source: Arc<dyn TaxonomySource>) -> Self {
        Self { source }
    }
}

impl std::fmt::Debug for TaxonomyActionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyActionProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ActionProvider for TaxonomyActionProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn execute(&self, config: &serde_json::Value, _ctx: &ExecutionContext) -> Result<String> {
        let vocabulary = require_str(Self::ID, config, "vocabulary")?;
        let separator = config
            .get("separator")
            .and_then(|v| v.as_str())
            .unwrap_or(", ");

        let terms = self.source.terms(vocabulary).await?;
        tracing::debug!(vocabulary, count = terms.len(), "Loaded taxonomy terms");

        Ok(terms
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(separator))
    }
}
