//! Span helpers for runs and steps.

use crate::context::RunIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Span;

/// Opens the span covering one pipeline run.
#[must_use]
pub fn run_span(identity: &RunIdentity) -> Span {
    tracing::info_span!(
        "pipeline_run",
        pipeline_id = %identity.pipeline_id,
        run_id = %identity.run_id,
    )
}

/// Opens the span covering one step execution.
#[must_use]
pub fn step_span(step_uuid: &str, step_type: &str, sequence: usize) -> Span {
    tracing::info_span!("step", step_uuid, step_type, sequence)
}

/// Attributes describing a finished step, for logs and events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSpanAttributes {
    /// Step uuid.
    pub step_uuid: String,
    /// Step type id.
    pub step_type: Option<String>,
    /// Final status.
    pub status: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl StepSpanAttributes {
    /// Creates attributes for a step.
    #[must_use]
    pub fn new(step_uuid: impl Into<String>) -> Self {
        Self {
            step_uuid: step_uuid.into(),
            ..Default::default()
        }
    }

    /// Sets the step type.
    #[must_use]
    pub fn with_step_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = Some(step_type.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flattens into string attributes.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("step.uuid".to_string(), self.step_uuid.clone());

        if let Some(ref v) = self.step_type {
            attrs.insert("step.type".to_string(), v.clone());
        }
        if let Some(ref v) = self.status {
            attrs.insert("step.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("step.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("step.error".to_string(), v.clone());
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
