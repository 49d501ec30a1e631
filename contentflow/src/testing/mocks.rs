//! Mock providers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::ExecutionContext;
use crate::errors::{ContentflowError, Result};
use crate::providers::{ActionProvider, LlmProvider, ProviderConfig};

/// A model provider that records calls and returns a configurable response.
///
/// Without a configured response it echoes the prompt back.
#[derive(Debug)]
pub struct MockLlmProvider {
    id: String,
    response: Mutex<Option<String>>,
    calls: Mutex<Vec<(ProviderConfig, String)>>,
}

impl MockLlmProvider {
    /// Creates a mock that echoes the prompt.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets a fixed response.
    #[must_use]
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.set_response(response);
        self
    }

    /// Changes the fixed response.
    pub fn set_response(&self, response: impl Into<String>) {
        *self.response.lock() = Some(response.into());
    }

    /// Returns the recorded `(config, prompt)` pairs.
    #[must_use]
    pub fn calls(&self) -> Vec<(ProviderConfig, String)> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(&self, config: &ProviderConfig, prompt: &str) -> Result<String> {
        self.calls.lock().push((config.clone(), prompt.to_string()));
        Ok(self
            .response
            .lock()
            .clone()
            .unwrap_or_else(|| prompt.to_string()))
    }
}

/// An action provider that records its configs and the results it saw.
#[derive(Debug)]
pub struct MockActionProvider {
    id: String,
    response: Mutex<String>,
    calls: Mutex<Vec<serde_json::Value>>,
    seen_results: Mutex<Vec<Vec<String>>>,
}

impl MockActionProvider {
    /// Creates a mock returning an empty string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: Mutex::new(String::new()),
            calls: Mutex::new(Vec::new()),
            seen_results: Mutex::new(Vec::new()),
        }
    }

    /// Sets the response.
    #[must_use]
    pub fn with_response(self, response: impl Into<String>) -> Self {
        *self.response.lock() = response.into();
        self
    }

    /// Returns the configs of every call.
    #[must_use]
    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().clone()
    }

    /// Returns the context results visible at each call.
    #[must_use]
    pub fn seen_results(&self) -> Vec<Vec<String>> {
        self.seen_results.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ActionProvider for MockActionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, config: &serde_json::Value, ctx: &ExecutionContext) -> Result<String> {
        self.calls.lock().push(config.clone());
        self.seen_results.lock().push(ctx.results().to_vec());
        Ok(self.response.lock().clone())
    }
}

/// A provider that always fails with a provider error.
#[derive(Debug)]
pub struct FailingProvider {
    id: String,
    message: String,
    call_count: Mutex<usize>,
}

impl FailingProvider {
    /// Creates a failing provider.
    #[must_use]
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            call_count: Mutex::new(0),
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    fn fail(&self) -> ContentflowError {
        *self.call_count.lock() += 1;
        ContentflowError::provider(&self.id, &self.message)
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(&self, _config: &ProviderConfig, _prompt: &str) -> Result<String> {
        Err(self.fail())
    }
}

#[async_trait]
impl ActionProvider for FailingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, _config: &serde_json::Value, _ctx: &ExecutionContext) -> Result<String> {
        Err(self.fail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_echoes_without_response() {
        let mock = MockLlmProvider::new("openai");
        let config = ProviderConfig::new("cfg", "openai");

        let out = mock.call(&config, "hello").await.unwrap();

        assert_eq!(out, "hello");
        assert_eq!(mock.call_count(), 1);
        mock.reset();
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_action_records_results_seen() {
        let mock = MockActionProvider::new("notify").with_response("ok");
        let mut ctx = ExecutionContext::for_pipeline("p1");
        ctx.record_output("s1", None, "first");

        mock.execute(&serde_json::json!({"a": 1}), &ctx).await.unwrap();

        assert_eq!(mock.calls()[0]["a"], 1);
        assert_eq!(mock.seen_results(), vec![vec!["first".to_string()]]);
    }

    #[tokio::test]
    async fn test_failing_provider_counts_calls() {
        let failing = FailingProvider::new("boom", "down");
        let ctx = ExecutionContext::for_pipeline("p1");

        let err = ActionProvider::execute(&failing, &serde_json::Value::Null, &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ProviderError");
        assert_eq!(failing.call_count(), 1);
    }
}
