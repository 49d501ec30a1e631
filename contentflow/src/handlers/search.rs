//! Loads search API credentials for search steps.

use super::StepDataHandler;
use crate::collaborators::Collaborators;
use crate::errors::Result;
use crate::steps::{StepDefinition, StepPayload};
use async_trait::async_trait;

/// Loads the provider config holding the search API credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStepHandler;

#[async_trait]
impl StepDataHandler for SearchStepHandler {
    async fn process_step_data(
        &self,
        mut definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        let StepPayload::Search(payload) = &definition.configuration.payload else {
            return Ok(definition);
        };
        let Some(config_id) = payload
            .provider_config
            .clone()
            .filter(|id| !id.trim().is_empty())
        else {
            return Ok(definition);
        };

        let config = collaborators
            .provider_configs
            .load_provider_config(&config_id)
            .await?;
        let resolved = &mut definition.configuration.resolved;
        resolved.provider_id = Some(config.provider.clone());
        resolved.provider_config = Some(config);
        Ok(definition)
    }
}
