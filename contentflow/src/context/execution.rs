//! Mutable execution context for one pipeline run.

use super::RunIdentity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Transient state shared by the steps of a single run.
///
/// Created once per run and discarded afterwards. Steps receive it by
/// mutable reference one at a time, so there is exactly one writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Run identity.
    identity: RunIdentity,
    /// Step outputs in execution order. Append-only.
    results: Vec<String>,
    /// Step uuid to the output key it declared.
    memory: HashMap<String, String>,
    /// Output key to the output produced under it.
    outputs: HashMap<String, String>,
    /// Last error recorded by a failing step.
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    /// Output of the most recent successful step.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_response: Option<String>,
}

impl ExecutionContext {
    /// Creates an empty context for a run.
    #[must_use]
    pub fn new(identity: RunIdentity) -> Self {
        Self {
            identity,
            results: Vec::new(),
            memory: HashMap::new(),
            outputs: HashMap::new(),
            error_message: None,
            last_response: None,
        }
    }

    /// Creates a context for a pipeline with a fresh run identity.
    #[must_use]
    pub fn for_pipeline(pipeline_id: impl Into<String>) -> Self {
        Self::new(RunIdentity::new(pipeline_id))
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns all results so far, oldest first.
    #[must_use]
    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// Returns the uuid to output-key map.
    #[must_use]
    pub fn memory(&self) -> &HashMap<String, String> {
        &self.memory
    }

    /// Returns the most recent result, if any.
    #[must_use]
    pub fn previous_result(&self) -> Option<&str> {
        self.results.last().map(String::as_str)
    }

    /// Returns the output stored under an output key.
    #[must_use]
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs.get(key).map(String::as_str)
    }

    /// Returns all keyed outputs.
    #[must_use]
    pub fn outputs(&self) -> &HashMap<String, String> {
        &self.outputs
    }

    /// Records a step's output.
    ///
    /// Appends to `results`, remembers the step's output key and updates
    /// `last_response`.
    pub fn record_output(
        &mut self,
        step_uuid: &str,
        output_key: Option<&str>,
        output: impl Into<String>,
    ) {
        let output = output.into();

        if let Some(key) = output_key.filter(|k| !k.is_empty()) {
            self.memory.insert(step_uuid.to_string(), key.to_string());
            self.outputs.insert(key.to_string(), output.clone());
        }

        self.last_response = Some(output.clone());
        self.results.push(output);
    }

    /// Returns the last recorded error message.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Records an error message.
    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Clears the recorded error.
    pub fn clear_error_message(&mut self) {
        self.error_message = None;
    }

    /// Returns the last response.
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Overrides the last response without appending a result.
    pub fn set_last_response(&mut self, response: impl Into<String>) {
        self.last_response = Some(response.into());
    }

    /// JSON view used as payload for external actions.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.identity.run_id.to_string(),
            "pipeline_id": self.identity.pipeline_id,
            "results": self.results,
            "outputs": self.outputs,
            "last_response": self.last_response,
            "error_message": self.error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = ExecutionContext::for_pipeline("p1");

        assert!(ctx.results().is_empty());
        assert!(ctx.memory().is_empty());
        assert!(ctx.previous_result().is_none());
        assert!(ctx.error_message().is_none());
        assert!(ctx.last_response().is_none());
        assert_eq!(ctx.identity().pipeline_id, "p1");
    }

    #[test]
    fn test_record_output_appends_in_order() {
        let mut ctx = ExecutionContext::for_pipeline("p1");
        ctx.record_output("uuid-a", Some("topic"), "rust");
        ctx.record_output("uuid-b", None, "draft");

        assert_eq!(ctx.results(), &["rust".to_string(), "draft".to_string()]);
        assert_eq!(ctx.previous_result(), Some("draft"));
        assert_eq!(ctx.last_response(), Some("draft"));
        assert_eq!(ctx.memory().get("uuid-a"), Some(&"topic".to_string()));
        assert!(!ctx.memory().contains_key("uuid-b"));
        assert_eq!(ctx.output("topic"), Some("rust"));
    }

    #[test]
    fn test_empty_output_key_is_not_remembered() {
        let mut ctx = ExecutionContext::for_pipeline("p1");
        ctx.record_output("uuid-a", Some(""), "value");

        assert!(ctx.memory().is_empty());
        assert_eq!(ctx.results().len(), 1);
    }

    #[test]
    fn test_error_message_roundtrip() {
        let mut ctx = ExecutionContext::for_pipeline("p1");
        ctx.set_error_message("boom");
        assert_eq!(ctx.error_message(), Some("boom"));

        ctx.clear_error_message();
        assert!(ctx.error_message().is_none());
    }

    #[test]
    fn test_to_json() {
        let mut ctx = ExecutionContext::for_pipeline("p1");
        ctx.record_output("u", Some("k"), "v");

        let json = ctx.to_json();
        assert_eq!(json["pipeline_id"], "p1");
        assert_eq!(json["results"][0], "v");
        assert_eq!(json["outputs"]["k"], "v");
        assert_eq!(json["last_response"], "v");
    }
}
