//! What a run produced, in the shape an external run recorder needs.

use crate::context::ExecutionContext;
use crate::errors::ContentflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step ran and produced output.
    Completed,
    /// The step raised an error.
    Failed,
    /// The step type has no executable contract.
    NotExecutable,
}

/// Record of one step execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRunReport {
    /// Step uuid.
    pub step_uuid: String,
    /// Step type id, when the step could be loaded.
    pub step_type: Option<String>,
    /// Position in the run, starting at 1.
    pub sequence: usize,
    /// Outcome.
    pub status: StepStatus,
    /// Output on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error kind on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
    /// Human-readable progress line.
    pub progress_message: String,
}

impl StepRunReport {
    pub(crate) fn completed(
        step_uuid: &str,
        step_type: &str,
        sequence: usize,
        output: String,
        started_at: DateTime<Utc>,
        progress_message: String,
    ) -> Self {
        Self {
            step_uuid: step_uuid.to_string(),
            step_type: Some(step_type.to_string()),
            sequence,
            status: StepStatus::Completed,
            output: Some(output),
            error: None,
            error_kind: None,
            started_at,
            finished_at: Utc::now(),
            progress_message,
        }
    }

    pub(crate) fn failed(
        step_uuid: &str,
        step_type: Option<&str>,
        sequence: usize,
        error: &ContentflowError,
        started_at: DateTime<Utc>,
        progress_message: String,
    ) -> Self {
        let status = if matches!(error, ContentflowError::NotExecutable { .. }) {
            StepStatus::NotExecutable
        } else {
            StepStatus::Failed
        };
        Self {
            step_uuid: step_uuid.to_string(),
            step_type: step_type.map(str::to_string),
            sequence,
            status,
            output: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
            started_at,
            finished_at: Utc::now(),
            progress_message,
        }
    }

    /// Whether the step completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// Duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Record of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Pipeline id.
    pub pipeline_id: String,
    /// Run id.
    pub run_id: String,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
    /// Per-step records in execution order.
    pub steps: Vec<StepRunReport>,
    /// Failure counter after the run.
    pub execution_failures: u32,
    /// Whether this run disabled the pipeline.
    pub pipeline_disabled: bool,
    /// Final context.
    pub context: ExecutionContext,
}

impl RunReport {
    /// Steps that completed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.is_success()).count()
    }

    /// Steps that did not complete.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }

    /// Whether every step completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Step uuids in execution order.
    #[must_use]
    pub fn executed_uuids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_uuid.as_str()).collect()
    }
}
