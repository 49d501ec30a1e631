//! Run events for observability.
//!
//! The run driver reports progress as typed [`PipelineEvent`]s to an
//! injected [`EventSink`]. Sinks must never fail the run.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A run started.
    RunStarted {
        /// Pipeline id.
        pipeline_id: String,
        /// Run id.
        run_id: String,
        /// Number of steps queued.
        step_count: usize,
    },
    /// A step started executing.
    StepStarted {
        /// Pipeline id.
        pipeline_id: String,
        /// Step uuid.
        step_uuid: String,
        /// Step type id.
        step_type: String,
        /// Position in the run, starting at 1.
        sequence: usize,
    },
    /// A step finished successfully.
    StepCompleted {
        /// Pipeline id.
        pipeline_id: String,
        /// Step uuid.
        step_uuid: String,
        /// Duration in milliseconds.
        duration_ms: f64,
    },
    /// A step failed.
    StepFailed {
        /// Pipeline id.
        pipeline_id: String,
        /// Step uuid.
        step_uuid: String,
        /// Error kind.
        error_kind: String,
        /// Error message.
        error: String,
    },
    /// A run finished.
    RunCompleted {
        /// Pipeline id.
        pipeline_id: String,
        /// Run id.
        run_id: String,
        /// Steps that succeeded.
        succeeded: usize,
        /// Steps that failed.
        failed: usize,
    },
    /// The pipeline was disabled after repeated failures.
    PipelineDisabled {
        /// Pipeline id.
        pipeline_id: String,
        /// Counter value at the time.
        execution_failures: u32,
    },
}

impl PipelineEvent {
    /// Dotted event type name, e.g. `step.failed`.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::StepStarted { .. } => "step.started",
            Self::StepCompleted { .. } => "step.completed",
            Self::StepFailed { .. } => "step.failed",
            Self::RunCompleted { .. } => "run.completed",
            Self::PipelineDisabled { .. } => "pipeline.disabled",
        }
    }

    /// JSON payload of the event.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
