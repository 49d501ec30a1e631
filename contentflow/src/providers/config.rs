//! Stored provider configuration.

use crate::errors::{ContentflowError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of one provider account, referenced by id from step payloads.
///
/// Owned by the configuration collaborator; the engine only reads it.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Config id.
    pub id: String,
    /// Provider id in the registry (`openai`, `elevenlabs`, ...).
    pub provider: String,
    /// Model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key or token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Secondary secret (account tokens and the like).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Voice id for speech providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Provider-specific parameters (temperature, size, ...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Per-call timeout override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("endpoint", &self.endpoint)
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Creates a config for a provider.
    #[must_use]
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the voice.
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Returns the model or a configuration error.
    pub fn require_model(&self) -> Result<&str> {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                ContentflowError::configuration(format!(
                    "provider config '{}' has no model name",
                    self.id
                ))
            })
    }

    /// Returns the API key, falling back to an environment variable.
    pub fn api_key_or_env(&self, env_var: &str) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var(env_var).map_err(|_| {
            ContentflowError::configuration(format!(
                "provider config '{}' has no API key and {env_var} is not set",
                self.id
            ))
        })
    }

    /// Returns the endpoint or the given default, without a trailing slash.
    #[must_use]
    pub fn endpoint_or(&self, default: &str) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    /// Returns a parameter.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters.get(key)
    }

    /// Returns the timeout override or the given default.
    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout_seconds.map_or(default, Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_model() {
        let config = ProviderConfig::new("c", "openai");
        assert_eq!(config.require_model().unwrap_err().kind(), "ConfigurationError");

        let config = config.with_model("gpt-4");
        assert_eq!(config.require_model().unwrap(), "gpt-4");
    }

    #[test]
    fn test_api_key_from_config() {
        let config = ProviderConfig::new("c", "openai").with_api_key("sk-test");
        assert_eq!(config.api_key_or_env("CONTENTFLOW_TEST_UNSET_KEY").unwrap(), "sk-test");
    }

    #[test]
    fn test_missing_api_key() {
        let config = ProviderConfig::new("c", "openai");
        let err = config.api_key_or_env("CONTENTFLOW_TEST_UNSET_KEY").unwrap_err();
        assert!(err.to_string().contains("CONTENTFLOW_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = ProviderConfig::new("c", "openai").with_endpoint("http://localhost:1234/v1/");
        assert_eq!(config.endpoint_or("https://x"), "http://localhost:1234/v1");
        assert_eq!(ProviderConfig::new("c", "o").endpoint_or("https://x/"), "https://x");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new("c", "openai").with_api_key("sk-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("has_api_key: true"));
    }
}
