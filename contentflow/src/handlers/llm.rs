//! Resolves the stored model configuration of language-model steps.

use super::StepDataHandler;
use crate::collaborators::Collaborators;
use crate::errors::Result;
use crate::providers::resolve_provider;
use crate::steps::{StepDefinition, StepPayload};
use async_trait::async_trait;

/// Loads the provider config named by `llm_config` and attaches it with its
/// model and provider id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LlmStepHandler;

#[async_trait]
impl StepDataHandler for LlmStepHandler {
    async fn process_step_data(
        &self,
        mut definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        let StepPayload::Llm(payload) = &definition.configuration.payload else {
            return Ok(definition);
        };
        let Some(config_id) = payload.llm_config.clone().filter(|id| !id.trim().is_empty()) else {
            return Ok(definition);
        };

        let config = collaborators
            .provider_configs
            .load_provider_config(&config_id)
            .await?;
        let provider_id = if config.provider.trim().is_empty() {
            resolve_provider(config.model.as_deref().unwrap_or_default()).to_string()
        } else {
            config.provider.clone()
        };
        tracing::debug!(
            step_uuid = %definition.uuid,
            config_id = %config_id,
            provider = %provider_id,
            "Resolved LLM provider config"
        );

        let resolved = &mut definition.configuration.resolved;
        resolved.model.clone_from(&config.model);
        resolved.provider_id = Some(provider_id);
        resolved.provider_config = Some(config);
        Ok(definition)
    }
}
