//! Loads the uploaded file referenced by upload steps.

use super::StepDataHandler;
use crate::collaborators::Collaborators;
use crate::errors::{ContentflowError, Result};
use crate::steps::{StepDefinition, StepPayload};
use async_trait::async_trait;

/// Loads the referenced uploaded file.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadStepHandler;

#[async_trait]
impl StepDataHandler for UploadStepHandler {
    async fn process_step_data(
        &self,
        mut definition: StepDefinition,
        collaborators: &Collaborators,
    ) -> Result<StepDefinition> {
        let StepPayload::Upload(payload) = &definition.configuration.payload else {
            return Ok(definition);
        };
        let file_id = payload.file_id.trim();
        if file_id.is_empty() {
            return Err(ContentflowError::configuration(format!(
                "upload step '{}' references no file",
                definition.uuid
            )));
        }

        let file = collaborators.files.load_file(file_id).await?;
        tracing::debug!(
            step_uuid = %definition.uuid,
            file_id,
            mime_type = %file.mime_type,
            size = file.size,
            "Attached uploaded file"
        );
        definition.configuration.resolved.file = Some(file);
        Ok(definition)
    }
}
