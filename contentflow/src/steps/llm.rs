//! Language-model step.

use super::base::executable_step_type;
use super::{
    ConfigurableStep, ExecutableStep, StepDefinition, StepPayload, StepServices, StepType,
};
use crate::context::{render_template, ExecutionContext};
use crate::errors::{ContentflowError, Result};
use crate::providers::{lookup_provider, ProviderConfig};
use async_trait::async_trait;

/// Renders its prompt and sends it to an LLM provider.
///
/// Provider selection: the handler-resolved provider config when present,
/// otherwise `llm_service` as a model name through the lookup table (unknown
/// names use the default provider).
#[derive(Debug, Clone)]
pub struct LlmStep {
    base: ConfigurableStep,
    services: StepServices,
}

impl LlmStep {
    /// Binds the step to a definition.
    #[must_use]
    pub fn new(definition: StepDefinition, services: &StepServices) -> Self {
        Self {
            base: ConfigurableStep::new(definition),
            services: services.clone(),
        }
    }

    fn resolve(&self) -> Result<(String, ProviderConfig)> {
        let configuration = self.base.configuration();
        let StepPayload::Llm(payload) = &configuration.payload else {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has no language-model configuration",
                self.base.uuid()
            )));
        };
        let resolved = &configuration.resolved;

        if let Some(config) = &resolved.provider_config {
            let provider = resolved
                .provider_id
                .clone()
                .unwrap_or_else(|| config.provider.clone());
            return Ok((provider, config.clone()));
        }

        if let Some(config_id) = &payload.llm_config {
            return Err(ContentflowError::configuration(format!(
                "provider config '{config_id}' of step '{}' was not resolved",
                self.base.uuid()
            )));
        }

        let service = payload
            .llm_service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ContentflowError::configuration(format!(
                    "step '{}' names no provider config or model",
                    self.base.uuid()
                ))
            })?;

        let provider = lookup_provider(service).map_or_else(
            || {
                tracing::debug!(
                    model = service,
                    fallback = %self.services.default_llm_provider,
                    "Model not in lookup table, using default provider"
                );
                self.services.default_llm_provider.clone()
            },
            str::to_string,
        );
        let config = ProviderConfig::new(format!("{}-inline", self.base.uuid()), provider.clone())
            .with_model(service);
        Ok((provider, config))
    }
}

#[async_trait]
impl ExecutableStep for LlmStep {
    async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<String> {
        let (provider_id, config) = self.resolve()?;
        let StepPayload::Llm(payload) = &self.base.configuration().payload else {
            return Err(ContentflowError::configuration("missing prompt"));
        };
        let prompt = render_template(&payload.prompt, ctx);
        if prompt.trim().is_empty() {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has an empty prompt",
                self.base.uuid()
            )));
        }

        let provider = self.services.llm.get(&provider_id).map_err(|_| {
            ContentflowError::configuration(format!("unknown LLM provider '{provider_id}'"))
        })?;

        tracing::debug!(
            step_uuid = self.base.uuid(),
            provider = %provider_id,
            model = config.model.as_deref().unwrap_or_default(),
            prompt_chars = prompt.len(),
            "Calling LLM provider"
        );
        provider.call(&config, &prompt).await
    }
}

executable_step_type!(LlmStep);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{LlmPayload, StepType};
    use crate::testing::{mock_services, MockLlmProvider};
    use std::sync::Arc;

    fn step(payload: LlmPayload, services: &StepServices) -> LlmStep {
        LlmStep::new(
            StepDefinition::new(crate::steps::LLM_STEP, StepPayload::Llm(payload)).with_uuid("l1"),
            services,
        )
    }

    #[tokio::test]
    async fn test_model_name_resolves_through_lookup_table() {
        let services = mock_services();
        let mock = Arc::new(MockLlmProvider::new("openai").with_response("drafted"));
        services.llm.register_instance("openai", mock.clone());

        let mut step = step(
            LlmPayload {
                prompt: "Expand: {previous_result}".to_string(),
                llm_service: Some("gpt-4".to_string()),
                ..Default::default()
            },
            &services,
        );
        let mut ctx = ExecutionContext::for_pipeline("p");
        ctx.record_output("s0", None, "tides");

        let out = step.execute(&mut ctx).await.unwrap();
        assert_eq!(out, "drafted");
        let calls = mock.calls();
        assert_eq!(calls[0].0.model.as_deref(), Some("gpt-4"));
        assert_eq!(calls[0].1, "Expand: tides");
    }

    #[tokio::test]
    async fn test_resolved_config_wins() {
        let services = mock_services();
        let mock = Arc::new(MockLlmProvider::new("openai_image").with_response("https://img"));
        services.llm.register_instance("openai_image", mock.clone());

        let mut step = step(
            LlmPayload {
                prompt: "A lighthouse".to_string(),
                llm_config: Some("img".to_string()),
                ..Default::default()
            },
            &services,
        );
        let mut configuration = step.configuration().clone();
        configuration.resolved.provider_config =
            Some(ProviderConfig::new("img", "openai_image").with_model("dall-e-3"));
        configuration.resolved.provider_id = Some("openai_image".to_string());
        step.set_configuration(configuration);

        let out = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap();
        assert_eq!(out, "https://img");
    }

    #[tokio::test]
    async fn test_missing_model_is_configuration_error() {
        let services = mock_services();
        let mut step = step(
            LlmPayload {
                prompt: "hi".to_string(),
                ..Default::default()
            },
            &services,
        );

        let err = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[tokio::test]
    async fn test_unresolved_config_reference_is_configuration_error() {
        let services = mock_services();
        let mut step = step(
            LlmPayload {
                prompt: "hi".to_string(),
                llm_config: Some("gone".to_string()),
                ..Default::default()
            },
            &services,
        );

        let err = step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap_err();
        assert!(err.to_string().contains("gone"));
    }

    #[tokio::test]
    async fn test_unknown_model_uses_default_provider() {
        let services = mock_services().with_default_llm_provider("openai");
        let mock = Arc::new(MockLlmProvider::new("openai").with_response("ok"));
        services.llm.register_instance("openai", mock.clone());

        let mut step = step(
            LlmPayload {
                prompt: "hi".to_string(),
                llm_service: Some("llama-3".to_string()),
                ..Default::default()
            },
            &services,
        );

        assert_eq!(step.execute(&mut ExecutionContext::for_pipeline("p")).await.unwrap(), "ok");
        assert_eq!(mock.calls()[0].0.model.as_deref(), Some("llama-3"));
    }
}
