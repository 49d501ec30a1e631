//! The pipeline aggregate and its failure-tracking state machine.

use super::Schedule;
use crate::steps::{StepCollection, StepDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive failed runs after which a pipeline disables itself.
pub const FAILURE_THRESHOLD: u32 = 3;

fn default_enabled() -> bool {
    true
}

/// An ordered, schedulable workflow of steps.
///
/// `enabled` only turns false on its own when `execution_failures` reaches
/// [`FAILURE_THRESHOLD`]. Resetting the counter leaves `enabled` alone;
/// re-enabling resets the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    id: String,
    label: String,
    #[serde(default)]
    steps: StepCollection,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    execution_failures: u32,
    #[serde(default)]
    schedule: Schedule,
    #[serde(default)]
    instructions: String,
    created: DateTime<Utc>,
    changed: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_run_at: Option<DateTime<Utc>>,
}

impl Pipeline {
    /// Creates an enabled, manual pipeline with no steps.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            label: label.into(),
            steps: StepCollection::new(),
            enabled: true,
            execution_failures: 0,
            schedule: Schedule::manual(),
            instructions: String::new(),
            created: now,
            changed: now,
            last_run_at: None,
        }
    }

    /// Adds a step.
    #[must_use]
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.add_step(step);
        self
    }

    /// Sets the schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sets the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Pipeline id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Steps in stored order.
    #[must_use]
    pub fn steps(&self) -> &StepCollection {
        &self.steps
    }

    /// Steps, mutably. Marks the pipeline changed.
    pub fn steps_mut(&mut self) -> &mut StepCollection {
        self.touch();
        &mut self.steps
    }

    /// Adds or replaces a step.
    pub fn add_step(&mut self, step: StepDefinition) {
        self.steps_mut().push(step);
    }

    /// Removes a step.
    pub fn remove_step(&mut self, uuid: &str) -> Option<StepDefinition> {
        self.steps_mut().remove_instance_id(uuid)
    }

    /// Caches a step's last response. Returns false for unknown uuids.
    pub fn set_step_response(&mut self, uuid: &str, response: impl Into<String>) -> bool {
        let Some(step) = self.steps.get_mut(uuid) else {
            return false;
        };
        step.configuration.response = Some(response.into());
        self.touch();
        true
    }

    /// Schedule.
    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Replaces the schedule.
    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
        self.touch();
    }

    /// Free-text instructions.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Creation time.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Last mutation time.
    #[must_use]
    pub fn changed(&self) -> DateTime<Utc> {
        self.changed
    }

    /// Start of the most recent run.
    #[must_use]
    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    /// Records the start of a run.
    pub fn mark_run(&mut self, at: DateTime<Utc>) {
        self.last_run_at = Some(at);
        self.touch();
    }

    /// Whether the pipeline may run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consecutive failed runs.
    #[must_use]
    pub fn execution_failures(&self) -> u32 {
        self.execution_failures
    }

    /// Counts a failed run, disabling the pipeline at the threshold.
    pub fn increment_execution_failures(&mut self) {
        self.execution_failures = self.execution_failures.saturating_add(1);
        if self.execution_failures >= FAILURE_THRESHOLD && self.enabled {
            self.enabled = false;
            tracing::warn!(
                pipeline_id = %self.id,
                label = %self.label,
                execution_failures = self.execution_failures,
                "Pipeline disabled after {} consecutive failures",
                self.execution_failures
            );
        }
        self.touch();
    }

    /// Zeroes the failure counter. Does not re-enable.
    pub fn reset_execution_failures(&mut self) {
        self.execution_failures = 0;
        self.touch();
    }

    /// Enables (and resets the counter) or disables (counter untouched).
    pub fn set_status(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.execution_failures = 0;
        }
        self.touch();
    }

    /// Whether a scheduled run is due at `now`.
    ///
    /// Manual pipelines are never due. Disabled pipelines are never due.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }
        let since = self.last_run_at.unwrap_or(self.created);
        self.schedule
            .next_run_after(since)
            .is_some_and(|due| due <= now)
    }

    fn touch(&mut self) {
        self.changed = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RecurringFrequency;
    use chrono::TimeZone;

    #[test]
    fn test_disables_at_threshold() {
        let mut pipeline = Pipeline::new("p", "P");
        for n in 1..=2 {
            pipeline.increment_execution_failures();
            assert!(pipeline.is_enabled(), "disabled after {n} failures");
        }
        pipeline.increment_execution_failures();
        assert!(!pipeline.is_enabled());

        for _ in 0..5 {
            pipeline.increment_execution_failures();
            assert!(!pipeline.is_enabled());
        }
        assert_eq!(pipeline.execution_failures(), 8);
    }

    #[test]
    fn test_reset_does_not_reenable() {
        let mut pipeline = Pipeline::new("p", "P");
        for _ in 0..3 {
            pipeline.increment_execution_failures();
        }
        pipeline.reset_execution_failures();
        assert_eq!(pipeline.execution_failures(), 0);
        assert!(!pipeline.is_enabled());
    }

    #[test]
    fn test_set_status() {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.increment_execution_failures();
        pipeline.increment_execution_failures();

        pipeline.set_status(false);
        assert!(!pipeline.is_enabled());
        assert_eq!(pipeline.execution_failures(), 2);

        pipeline.set_status(true);
        assert!(pipeline.is_enabled());
        assert_eq!(pipeline.execution_failures(), 0);
    }

    #[test]
    fn test_mutations_bump_changed() {
        let mut pipeline = Pipeline::new("p", "P");
        let before = pipeline.changed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        pipeline.add_step(StepDefinition::llm("x").with_uuid("s1"));
        assert!(pipeline.changed() > before);
        assert!(pipeline.set_step_response("s1", "out"));
        assert!(!pipeline.set_step_response("ghost", "out"));
        assert_eq!(
            pipeline.steps().get("s1").unwrap().configuration.response.as_deref(),
            Some("out")
        );
    }

    #[test]
    fn test_is_due() {
        let anchor = Utc.with_ymd_and_hms(2020, 1, 1, 6, 0, 0).unwrap();
        let mut pipeline = Pipeline::new("p", "P")
            .with_schedule(Schedule::recurring(RecurringFrequency::Daily, anchor));
        pipeline.mark_run(Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap());

        assert!(!pipeline.is_due(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
        assert!(pipeline.is_due(Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap()));

        pipeline.set_status(false);
        assert!(!pipeline.is_due(Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap()));
    }

    #[test]
    fn test_serde_defaults() {
        let pipeline: Pipeline = serde_json::from_value(serde_json::json!({
            "id": "p",
            "label": "P",
            "created": "2026-01-01T00:00:00Z",
            "changed": "2026-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(pipeline.is_enabled());
        assert_eq!(pipeline.execution_failures(), 0);
        assert!(pipeline.steps().is_empty());
    }
}
