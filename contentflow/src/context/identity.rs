//! Run identity for tracking pipeline executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identifies one run of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this run.
    pub run_id: Uuid,

    /// The pipeline being run.
    pub pipeline_id: String,

    /// When the run was created.
    pub started_at: DateTime<Utc>,

    /// Who or what triggered the run ("manual", "scheduler", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
}

impl RunIdentity {
    /// Creates a new run identity with a generated run ID.
    #[must_use]
    pub fn new(pipeline_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline_id: pipeline_id.into(),
            started_at: Utc::now(),
            triggered_by: None,
        }
    }

    /// Sets the trigger source.
    #[must_use]
    pub fn with_trigger(mut self, triggered_by: impl Into<String>) -> Self {
        self.triggered_by = Some(triggered_by.into());
        self
    }

    /// Converts to a dictionary with string values (or null).
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("run_id".to_string(), serde_json::json!(self.run_id.to_string()));
        map.insert("pipeline_id".to_string(), serde_json::json!(self.pipeline_id));
        map.insert(
            "started_at".to_string(),
            serde_json::json!(self.started_at.to_rfc3339()),
        );
        map.insert(
            "triggered_by".to_string(),
            self.triggered_by
                .as_ref()
                .map_or(serde_json::Value::Null, |t| serde_json::json!(t)),
        );
        map
    }
}
