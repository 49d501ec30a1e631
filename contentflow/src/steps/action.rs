//! Action step.

use super::base::executable_step_type;
use super::{
    ConfigurableStep, ExecutableStep, ResolvedStepData, StepDefinition, StepPayload, StepServices,
    StepType,
};
use crate::context::ExecutionContext;
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;

/// Merges handler-resolved data into an action config without overriding
/// keys the config already sets.
pub(crate) fn merge_resolved(config: &serde_json::Value, resolved: &ResolvedStepData) -> serde_json::Value {
    let mut map = match config {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        other => return other.clone(),
    };

    if let Some(item) = &resolved.content {
        map.entry("content").or_insert_with(|| {
            serde_json::json!({
                "id": item.id,
                "title": item.title,
                "summary": item.summary,
                "image_url": item.image_url,
            })
        });
    }
    if let Some(provider) = &resolved.provider_config {
        for (key, value) in &provider.parameters {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        if let Some(key) = &provider.api_key {
            map.entry("api_key").or_insert_with(|| key.clone().into());
        }
        if let Some(endpoint) = &provider.endpoint {
            map.entry("endpoint").or_insert_with(|| endpoint.clone().into());
        }
    }

    serde_json::Value::Object(map)
}

/// Dispatches to the action provider named by `action_service`.
#[derive(Debug, Clone)]
pub struct ActionStep {
    base: ConfigurableStep,
    services: StepServices,
}

impl ActionStep {
    /// Binds the step to a definition.
    #[must_use]
    pub fn new(definition: StepDefinition, services: &StepServices) -> Self {
        Self {
            base: ConfigurableStep::new(definition),
            services: services.clone(),
        }
    }
}

#[async_trait]
impl ExecutableStep for ActionStep {
    async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<String> {
        let configuration = self.base.configuration();
        let StepPayload::Action(payload) = &configuration.payload else {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has no action configuration",
                self.base.uuid()
            )));
        };

        let service = payload.action_service.trim();
        if service.is_empty() {
            return Err(ContentflowError::configuration(format!(
                "step '{}' names no action service",
                self.base.uuid()
            )));
        }
        let provider = self.services.actions.get(service).map_err(|_| {
            ContentflowError::configuration(format!("unknown action service '{service}'"))
        })?;

        let config = merge_resolved(&payload.action_config, &configuration.resolved);
        tracing::debug!(step_uuid = self.base.uuid(), service, "Executing action");
        provider.execute(&config, ctx).await
    }
}

executable_step_type!(ActionStep);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ContentItem;
    use crate::providers::ProviderConfig;
    use crate::testing::{mock_services, MockActionProvider};
    use std::sync::Arc;

    #[test]
    fn test_merge_keeps_explicit_keys() {
        let resolved = ResolvedStepData {
            provider_config: Some(
                ProviderConfig::new("c", "news_api")
                    .with_api_key("from-config")
                    .with_parameter("language", serde_json::json!("en")),
            ),
            content: Some(ContentItem {
                id: "7".to_string(),
                title: "Tides".to_string(),
                body: String::new(),
                summary: Some("Short".to_string()),
                image_url: None,
            }),
            ..Default::default()
        };

        let merged = merge_resolved(&serde_json::json!({"api_key": "explicit"}), &resolved);
        assert_eq!(merged["api_key"], "explicit");
        assert_eq!(merged["language"], "en");
        assert_eq!(merged["content"]["title"], "Tides");
    }

    #[tokio::test]
    async fn test_dispatches_to_named_service() {
        let services = mock_services();
        let mock = Arc::new(MockActionProvider::new("notify").with_response("sent"));
        services.actions.register_instance("notify", mock.clone());

        let mut step = ActionStep::new(
            StepDefinition::action("notify", serde_json::json!({"channel": "ops"})),
            &services,
        );
        let out = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap();

        assert_eq!(out, "sent");
        assert_eq!(mock.calls()[0]["channel"], "ops");
    }

    #[tokio::test]
    async fn test_unknown_service_is_configuration_error() {
        let services = mock_services();
        let mut step = ActionStep::new(
            StepDefinition::action("nope", serde_json::Value::Null),
            &services,
        );

        let err = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
