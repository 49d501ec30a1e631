//! Step data handlers: per-type enrichment before execution.
//!
//! A handler loads whatever a step definition references (provider configs,
//! files, content items) and attaches it as
//! [`ResolvedStepData`](crate::steps::ResolvedStepData). Step types without a
//! handler pass through unchanged.

mod action;
mod llm;
mod search;
mod upload;

pub use action::ActionStepHandler;
pub use llm::LlmStepHandler;
pub use search::SearchStepHandler;
pub use upload::UploadStepHandler;

use crate::collaborators::Collaborators;
use crate::errors::Result;
use crate::steps::{StepDefinition, ACTION_STEP, LLM_STEP, SEARCH_STEP, UPLOAD_STEP};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Enriches a stored definition with execution-ready data.
#[async_trait]
pub trait StepDataHandler: Send + Sync {
    /// Returns the enriched definition.
    async fn process_step_data(
        &self,
        definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition>;
}

/// Returns definitions unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHandler;

#[async_trait]
impl StepDataHandler for PassthroughHandler {
    async fn process_step_data(
        &self,
        definition: StepDefinition,
        _collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        Ok(definition)
    }
}

/// Resolves handlers by step type id.
pub struct StepDataHandlerManager {
    handlers: HashMap<String, Arc<dyn StepDataHandler>>,
    fallback: Arc<dyn StepDataHandler>,
}

impl StepDataHandlerManager {
    /// Creates a manager with no handlers; everything passes through.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(PassthroughHandler),
        }
    }

    /// Creates a manager with the built-in handlers.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        manager.register(LLM_STEP, Arc::new(LlmStepHandler));
        manager.register(ACTION_STEP, Arc::new(ActionStepHandler));
        manager.register(SEARCH_STEP, Arc::new(SearchStepHandler));
        manager.register(UPLOAD_STEP, Arc::new(UploadStepHandler));
        manager
    }

    /// Registers a handler for a step type.
    pub fn register(&mut self, step_type_id: impl Into<String>, handler: Arc<dyn StepDataHandler>) {
        self.handlers.insert(step_type_id.into(), handler);
    }

    /// The handler for a step type, or the passthrough handler.
    #[must_use]
    pub fn handler_for(&self, step_type_id: &str) -> Arc<dyn StepDataHandler> {
        self.handlers
            .get(step_type_id)
            .map_or_else(|| Arc::clone(&self.fallback), Arc::clone)
    }

    /// Runs the matching handler over a definition.
    pub async fn process(
        &self,
        definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        let handler = self.handler_for(&definition.step_type_id);
        handler.process_step_data(definition, collaborators).await
    }
}

impl Default for StepDataHandlerManager {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for StepDataHandlerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("StepDataHandlerManager")
            .field("handlers", &ids)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_passthrough_is_identity() {
        let definition = StepDefinition::action("webhook", serde_json::json!({"a": 1}))
            .with_description("Notify")
            .with_weight(7);

        let out = PassthroughHandler
            .process_step_data(definition.clone(), &Collaborators::in_memory())
            .await
            .unwrap();
        assert_eq!(out, definition);
    }

    #[tokio::test]
    async fn test_unknown_type_falls_back_to_passthrough() {
        let manager = StepDataHandlerManager::with_builtin();
        let definition = StepDefinition::new("note_step", Default::default());

        let out = manager
            .process(definition.clone(), &Collaborators::in_memory())
            .await
            .unwrap();
        assert_eq!(out, definition);
    }
}
