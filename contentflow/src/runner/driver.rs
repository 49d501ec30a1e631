//! Sequential run driver.

use super::{RunReport, StepRunReport};
use crate::collaborators::{Collaborators, TaxonomySource};
use crate::context::{ExecutionContext, RunIdentity};
use crate::errors::{ContentflowError, Result};
use crate::events::{EventSink, NoOpEventSink, PipelineEvent};
use crate::handlers::StepDataHandlerManager;
use crate::observability::{run_span, step_span, SpanTimer, StepSpanAttributes};
use crate::pipeline::{Pipeline, PipelineRepository};
use crate::providers::{default_action_registry, default_llm_registry};
use crate::settings::Settings;
use crate::steps::{StepDefinition, StepInstances, StepServices, StepTypeRegistry};
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;

/// Runs pipelines one step at a time in ascending weight order.
///
/// A failing step is recorded into the context and the run moves on. After
/// the last step the pipeline's failure counter is updated once: a run with
/// any failed step counts as one failure, a fully successful run resets it.
pub struct RunDriver {
    repository: Arc<dyn PipelineRepository>,
    collaborators: Collaborators,
    services: StepServices,
    handlers: Arc<StepDataHandlerManager>,
    step_types: Arc<StepTypeRegistry>,
    events: Arc<dyn EventSink>,
}

impl RunDriver {
    /// Creates a driver with the built-in step types and handlers.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PipelineRepository>,
        collaborators: Collaborators,
        services: StepServices,
    ) -> Self {
        Self {
            repository,
            collaborators,
            services,
            handlers: Arc::new(StepDataHandlerManager::with_builtin()),
            step_types: Arc::new(StepTypeRegistry::with_builtin()),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a driver wired to the built-in providers.
    pub fn from_settings(
        settings: &Settings,
        repository: Arc<dyn PipelineRepository>,
        collaborators: Collaborators,
        taxonomy: Arc<dyn TaxonomySource>,
    ) -> Result<Self> {
        let llm = default_llm_registry(settings)?;
        let actions =
            default_action_registry(settings, taxonomy, Arc::clone(&collaborators.content))?;
        let services = StepServices::new(Arc::new(llm), Arc::new(actions))
            .with_default_llm_provider(settings.default_llm_provider.clone());
        Ok(Self::new(repository, collaborators, services))
    }

    /// Replaces the step data handlers.
    #[must_use]
    pub fn with_handlers(mut self, handlers: StepDataHandlerManager) -> Self {
        self.handlers = Arc::new(handlers);
        self
    }

    /// Replaces the step type registry.
    #[must_use]
    pub fn with_step_types(mut self, step_types: StepTypeRegistry) -> Self {
        self.step_types = Arc::new(step_types);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs every step of a pipeline.
    ///
    /// Disabled pipelines are refused with `PipelineDisabled`.
    pub async fn run(&self, pipeline_id: &str) -> Result<RunReport> {
        self.run_with_identity(RunIdentity::new(pipeline_id)).await
    }

    /// Runs a pipeline under a caller-supplied identity.
    pub async fn run_with_identity(&self, identity: RunIdentity) -> Result<RunReport> {
        let span = run_span(&identity);
        self.run_inner(identity).instrument(span).await
    }

    async fn run_inner(&self, identity: RunIdentity) -> Result<RunReport> {
        let pipeline_id = identity.pipeline_id.clone();
        let mut pipeline = self.repository.load(&pipeline_id).await?;
        if !pipeline.is_enabled() {
            tracing::warn!(pipeline_id = %pipeline_id, "Refusing to run disabled pipeline");
            return Err(ContentflowError::PipelineDisabled { pipeline_id });
        }

        let started_at = identity.started_at;
        let run_id = identity.run_id.to_string();
        pipeline.mark_run(started_at);
        self.repository.save(&pipeline).await?;

        let mut ordered = pipeline.steps().clone();
        ordered.sort();
        let uuids = ordered.uuids();

        tracing::info!(steps = uuids.len(), "Pipeline run started");
        self.events.emit(&PipelineEvent::RunStarted {
            pipeline_id: pipeline_id.clone(),
            run_id: run_id.clone(),
            step_count: uuids.len(),
        });

        let mut ctx = ExecutionContext::new(identity);
        let mut instances = StepInstances::new();
        let mut steps = Vec::with_capacity(uuids.len());
        for uuid in &uuids {
            let report = match self
                .process_step(&pipeline_id, uuid, &mut ctx, &mut instances)
                .await
            {
                Ok(report) => report,
                Err(err) => {
                    // The step vanished or the pipeline could not be reloaded.
                    ctx.set_error_message(err.to_string());
                    let sequence = steps.len() + 1;
                    StepRunReport::failed(uuid, None, sequence, &err, Utc::now(), err.to_string())
                }
            };
            steps.push(report);
        }

        let any_failed = steps.iter().any(|s| !s.is_success());
        let mut pipeline = self.repository.load(&pipeline_id).await?;
        let was_enabled = pipeline.is_enabled();
        if any_failed {
            pipeline.increment_execution_failures();
        } else if pipeline.execution_failures() > 0 {
            pipeline.reset_execution_failures();
        }
        self.repository.save(&pipeline).await?;

        let pipeline_disabled = was_enabled && !pipeline.is_enabled();
        if pipeline_disabled {
            self.events.emit(&PipelineEvent::PipelineDisabled {
                pipeline_id: pipeline_id.clone(),
                execution_failures: pipeline.execution_failures(),
            });
        }

        let report = RunReport {
            pipeline_id: pipeline_id.clone(),
            run_id: run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            steps,
            execution_failures: pipeline.execution_failures(),
            pipeline_disabled,
            context: ctx,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            execution_failures = report.execution_failures,
            "Pipeline run finished"
        );
        self.events.emit(&PipelineEvent::RunCompleted {
            pipeline_id,
            run_id,
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
        Ok(report)
    }

    /// Processes one step of a run.
    ///
    /// Errors are returned only when the pipeline or the step cannot be
    /// loaded. Step failures, including non-executable step types, are
    /// recorded into `ctx` and come back as a failed report.
    pub async fn process_step(
        &self,
        pipeline_id: &str,
        step_uuid: &str,
        ctx: &mut ExecutionContext,
        instances: &mut StepInstances,
    ) -> Result<StepRunReport> {
        let mut pipeline = self.repository.load(pipeline_id).await?;
        let definition = pipeline
            .steps()
            .get(step_uuid)
            .cloned()
            .ok_or_else(|| ContentflowError::not_found("step", step_uuid))?;

        let mut ordered = pipeline.steps().clone();
        ordered.sort();
        let total = ordered.len();
        let sequence = ordered
            .iter()
            .position(|d| d.uuid == step_uuid)
            .map_or(1, |i| i + 1);

        let span = step_span(step_uuid, &definition.step_type_id, sequence);
        self.process_loaded_step(&mut pipeline, definition, sequence, total, ctx, instances)
            .instrument(span)
            .await
    }

    async fn process_loaded_step(
        &self,
        pipeline: &mut Pipeline,
        definition: StepDefinition,
        sequence: usize,
        total: usize,
        ctx: &mut ExecutionContext,
        instances: &mut StepInstances,
    ) -> Result<StepRunReport> {
        let started_at = Utc::now();
        let timer = SpanTimer::start();
        let uuid = definition.uuid.clone();
        let step_type = definition.step_type_id.clone();

        self.events.emit(&PipelineEvent::StepStarted {
            pipeline_id: pipeline.id().to_string(),
            step_uuid: uuid.clone(),
            step_type: step_type.clone(),
            sequence,
        });

        for key in &definition.configuration.required_steps {
            if ctx.output(key).is_none() {
                tracing::warn!(required = %key, "Required output has not been produced yet");
            }
        }

        let label = if definition.configuration.step_description.is_empty() {
            step_type.clone()
        } else {
            definition.configuration.step_description.clone()
        };
        let output_key = definition.configuration.step_output_key.clone();

        let outcome = self.execute_step(definition, ctx, instances).await;
        let attributes = StepSpanAttributes::new(&uuid)
            .with_step_type(&step_type)
            .with_duration_ms(timer.elapsed_ms());

        let report = match outcome {
            Ok(output) => {
                ctx.record_output(&uuid, output_key.as_deref(), output.clone());
                pipeline.set_step_response(&uuid, output.clone());
                self.repository.save(pipeline).await?;

                let attributes = attributes.with_status("completed");
                tracing::info!(attributes = ?attributes.to_attributes(), "Step completed");
                self.events.emit(&PipelineEvent::StepCompleted {
                    pipeline_id: pipeline.id().to_string(),
                    step_uuid: uuid.clone(),
                    duration_ms: timer.elapsed_ms(),
                });

                let message = format!("Step {sequence} of {total} ({label}) completed");
                StepRunReport::completed(&uuid, &step_type, sequence, output, started_at, message)
            }
            Err(err) => {
                ctx.set_error_message(format!("{label}: {err}"));
                self.repository.save(pipeline).await?;

                let attributes = attributes.with_status("failed").with_error(err.to_string());
                tracing::warn!(
                    error_kind = err.kind(),
                    attributes = ?attributes.to_attributes(),
                    "Step failed"
                );
                self.events.emit(&PipelineEvent::StepFailed {
                    pipeline_id: pipeline.id().to_string(),
                    step_uuid: uuid.clone(),
                    error_kind: err.kind().to_string(),
                    error: err.to_string(),
                });

                let message = format!("Step {sequence} of {total} ({label}) failed: {err}");
                StepRunReport::failed(&uuid, Some(&step_type), sequence, &err, started_at, message)
            }
        };
        Ok(report)
    }

    async fn execute_step(
        &self,
        definition: StepDefinition,
        ctx: &mut ExecutionContext,
        instances: &mut StepInstances,
    ) -> Result<String> {
        let processed = self.handlers.process(definition, &self.collaborators).await?;
        let instance = instances.get_or_create(&processed, &self.step_types, &self.services)?;
        instance.set_weight(processed.weight);
        instance.set_configuration(processed.configuration);

        let step_type = instance.id().to_string();
        let Some(executable) = instance.as_executable() else {
            return Err(ContentflowError::not_executable(step_type));
        };
        executable.execute(ctx).await
    }
}

impl std::fmt::Debug for RunDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunDriver")
            .field("services", &self.services)
            .field("handlers", &self.handlers)
            .field("step_types", &self.step_types)
            .finish_non_exhaustive()
    }
}
