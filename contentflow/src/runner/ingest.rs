//! Ingestion of step results produced outside the driver.

use crate::collaborators::{ContentItem, ContentStore};
use crate::errors::{ContentflowError, Result};
use crate::pipeline::PipelineRepository;
use crate::providers::{parse_content_payload, CreateContentProvider};
use crate::steps::StepPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct IngestPayload {
    step_results: BTreeMap<String, StepResult>,
}

#[derive(Debug, Deserialize)]
struct StepResult {
    output: serde_json::Value,
}

/// What an ingestion changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Steps whose response was written.
    pub updated: Vec<String>,
    /// Uuids not found in the pipeline.
    pub skipped: Vec<String>,
    /// Content items created from `create_content` steps.
    pub created_content: Vec<ContentItem>,
}

/// Writes externally produced step outputs back into a pipeline.
///
/// Accepts `{"step_results": {"<uuid>": {"output": ...}}}`. Each output
/// becomes that step's cached response. Action steps whose service is
/// `create_content` also turn their `{title, body}` output into a content
/// item.
pub struct ResultIngestor {
    repository: Arc<dyn PipelineRepository>,
    content: Arc<dyn ContentStore>,
}

impl ResultIngestor {
    /// Creates an ingestor.
    #[must_use]
    pub fn new(repository: Arc<dyn PipelineRepository>, content: Arc<dyn ContentStore>) -> Self {
        Self {
            repository,
            content,
        }
    }

    /// Ingests a JSON document for a pipeline.
    ///
    /// Malformed JSON, or a `create_content` output without a title and body,
    /// fails with `ValidationError` before anything is saved.
    pub async fn ingest(&self, pipeline_id: &str, document: &str) -> Result<IngestReport> {
        let payload: IngestPayload = serde_json::from_str(document)
            .map_err(|e| ContentflowError::validation(format!("invalid execution results: {e}")))?;

        let mut pipeline = self.repository.load(pipeline_id).await?;
        let mut report = IngestReport::default();
        let mut to_create = Vec::new();

        for (uuid, result) in payload.step_results {
            let output = match result.output {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };

            let Some(step) = pipeline.steps().get(&uuid) else {
                tracing::warn!(pipeline_id, step_uuid = %uuid, "Skipping result for unknown step");
                report.skipped.push(uuid);
                continue;
            };
            if let StepPayload::Action(action) = &step.configuration.payload {
                if action.action_service == CreateContentProvider::ID {
                    to_create.push(parse_content_payload(&output)?);
                }
            }

            pipeline.set_step_response(&uuid, output);
            report.updated.push(uuid);
        }

        self.repository.save(&pipeline).await?;

        for item in to_create {
            let created = self.content.create_content(item).await?;
            tracing::info!(pipeline_id, content_id = %created.id, "Created content item from results");
            report.created_content.push(created);
        }

        tracing::info!(
            pipeline_id,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "Ingested execution results"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ResultIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultIngestor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryContentStore;
    use crate::pipeline::{InMemoryPipelineRepository, Pipeline};
    use crate::steps::StepDefinition;
    use pretty_assertions::assert_eq;

    fn setup() -> (Arc<InMemoryPipelineRepository>, Arc<InMemoryContentStore>, ResultIngestor) {
        let repository = Arc::new(InMemoryPipelineRepository::new());
        repository.insert(
            Pipeline::new("p", "Blog")
                .with_step(StepDefinition::llm("draft").with_uuid("draft"))
                .with_step(
                    StepDefinition::action("create_content", serde_json::Value::Null)
                        .with_uuid("publish"),
                ),
        );
        let content = Arc::new(InMemoryContentStore::new());
        let ingestor = ResultIngestor::new(repository.clone(), content.clone());
        (repository, content, ingestor)
    }

    #[tokio::test]
    async fn test_writes_responses_and_creates_content() {
        let (repository, content, ingestor) = setup();
        let document = serde_json::json!({
            "step_results": {
                "draft": {"output": "A draft"},
                "publish": {"output": "{\"title\": \"Tides\", \"body\": \"Water\"}"},
                "ghost": {"output": "ignored"},
            }
        })
        .to_string();

        let report = ingestor.ingest("p", &document).await.unwrap();
        assert_eq!(report.updated, vec!["draft", "publish"]);
        assert_eq!(report.skipped, vec!["ghost"]);
        assert_eq!(report.created_content[0].title, "Tides");
        assert_eq!(content.items().len(), 1);

        let stored = repository.get("p").unwrap();
        assert_eq!(
            stored.steps().get("draft").unwrap().configuration.response.as_deref(),
            Some("A draft")
        );
    }

    #[tokio::test]
    async fn test_malformed_document_is_validation_error() {
        let (_, _, ingestor) = setup();
        let err = ingestor.ingest("p", "{not json").await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[tokio::test]
    async fn test_bad_content_payload_saves_nothing() {
        let (repository, content, ingestor) = setup();
        let document = serde_json::json!({
            "step_results": {
                "draft": {"output": "A draft"},
                "publish": {"output": "no json here"},
            }
        })
        .to_string();

        let err = ingestor.ingest("p", &document).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(content.items().is_empty());
        assert!(repository
            .get("p")
            .unwrap()
            .steps()
            .get("draft")
            .unwrap()
            .configuration
            .response
            .is_none());
    }
}
