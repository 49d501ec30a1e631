//! Upload step.

use super::base::executable_step_type;
use super::{ConfigurableStep, ExecutableStep, StepDefinition, StepPayload, StepServices, StepType};
use crate::context::ExecutionContext;
use crate::errors::{ContentflowError, Result};
use async_trait::async_trait;

/// Emits the JSON description of a handler-resolved uploaded file, or hands
/// it to an action provider under the `file` key when `action_service` is set.
#[derive(Debug, Clone)]
pub struct UploadStep {
    base: ConfigurableStep,
    services: StepServices,
}

impl UploadStep {
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
impl ExecutableStep for UploadStep {
    async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<String> {
        let configuration = self.base.configuration();
        let StepPayload::Upload(payload) = &configuration.payload else {
            return Err(ContentflowError::configuration(format!(
                "step '{}' has no upload configuration",
                self.base.uuid()
            )));
        };
        let file = configuration.resolved.file.as_ref().ok_or_else(|| {
            ContentflowError::configuration(format!(
                "file '{}' of step '{}' was not resolved",
                payload.file_id,
                self.base.uuid()
            ))
        })?;
        let description = serde_json::to_value(file)?;

        let Some(service) = payload.action_service.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(description.to_string());
        };

        let provider = self.services.actions.get(service).map_err(|_| {
            ContentflowError::configuration(format!("unknown action service '{service}'"))
        })?;
        let mut config = match &payload.action_config {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        config.insert("file".to_string(), description);

        tracing::debug!(step_uuid = self.base.uuid(), service, file_id = %file.id, "Handing upload to action");
        provider.execute(&serde_json::Value::Object(config), ctx).await
    }
}

executable_step_type!(UploadStep);
