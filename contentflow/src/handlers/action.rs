//! Loads content items and provider credentials for action steps.

use super::StepDataHandler;
use crate::collaborators::Collaborators;
use crate::errors::Result;
use crate::steps::{StepDefinition, StepPayload};
use async_trait::async_trait;

fn reference(id: Option<&String>) -> Option<&str> {
    id.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Loads the referenced content item and credentials config, concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStepHandler;

#[async_trait]
impl StepDataHandler for ActionStepHandler {
    async fn process_step_data(
        &self,
        mut definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        let StepPayload::Action(payload) = &definition.configuration.payload else {
            return Ok(definition);
        };
        let content_id = reference(payload.content_id.as_ref()).map(str::to_string);
        let config_id = reference(payload.provider_config.as_ref()).map(str::to_string);

        let load_content = async {
            match &content_id {
                Some(id) => collaborators.content.load_content(id).await.map(Some),
                None => Ok(None),
            }
        };
        let load_config = async {
            match &config_id {
                Some(id) => collaborators
                    .provider_configs
                    .load_provider_config(id)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };
        let (content, config) = futures::try_join!(load_content, load_config)?;

        if let Some(item) = &content {
            tracing::debug!(step_uuid = %definition.uuid, content_id = %item.id, "Attached content item");
        }
        let resolved = &mut definition.configuration.resolved;
        if let Some(config) = config {
            resolved.provider_id = Some(config.provider.clone());
            resolved.model.clone_from(&config.model);
            resolved.provider_config = Some(config);
        }
        resolved.content = content;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{ContentItem, InMemoryContentStore};
    use crate::steps::ActionPayload;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_attaches_content_item() {
        let content = InMemoryContentStore::new();
        content.insert(ContentItem {
            id: "9".to_string(),
            title: "Tides".to_string(),
            body: "Long body".to_string(),
            summary: Some("Short".to_string()),
            image_url: Some("https://img.example/t.png".to_string()),
        });
        let base = Collaborators::in_memory();
        let collaborators = Collaborators::new(base.provider_configs, base.files, Arc::new(content));

        let definition = StepDefinition::new(
            crate::steps::ACTION_STEP,
            StepPayload::Action(ActionPayload {
                action_service: "social_post".to_string(),
                content_id: Some("9".to_string()),
                ..Default::default()
            }),
        );
        let out = ActionStepHandler
            .process_step_data(definition, &collaborators)
            .await
            .unwrap();

        let item = out.configuration.resolved.content.unwrap();
        assert_eq!(item.summary.as_deref(), Some("Short"));
        assert!(out.configuration.resolved.provider_config.is_none());
    }

    #[tokio::test]
    async fn test_missing_content_is_not_found() {
        let definition = StepDefinition::new(
            crate::steps::ACTION_STEP,
            StepPayload::Action(ActionPayload {
                content_id: Some("404".to_string()),
                ..Default::default()
            }),
        );
        let err = ActionStepHandler
            .process_step_data(definition, &Collaborators::in_memory())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFoundError");
    }
}
