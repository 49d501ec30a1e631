//! Engine-wide settings.
//!
//! Settings deserialize with per-field defaults, so a partial JSON document
//! or an empty environment both yield a working configuration.

use crate::errors::{ContentflowError, Result};
use crate::observability::LogFormat;
use crate::webhook::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix of every environment variable read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "CONTENTFLOW_";

/// Settings shared by providers, the dispatcher and the run driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider used when a model name is not in the lookup table.
    #[serde(default = "default_llm_provider")]
    pub default_llm_provider: String,
    /// Timeout for chat-completion calls.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_seconds: u64,
    /// Timeout for image-generation calls.
    #[serde(default = "default_image_timeout")]
    pub image_timeout_seconds: u64,
    /// Timeout for text-to-speech calls.
    #[serde(default = "default_speech_timeout")]
    pub speech_timeout_seconds: u64,
    /// Timeout for search and page fetches.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    /// Where synthesized audio is written.
    #[serde(default = "default_audio_output_dir")]
    pub audio_output_dir: PathBuf,
    /// User agent for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Backoff used by the webhook dispatcher.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_llm_provider() -> String {
    crate::providers::DEFAULT_PROVIDER.to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_image_timeout() -> u64 {
    120
}

fn default_speech_timeout() -> u64 {
    60
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_audio_output_dir() -> PathBuf {
    std::env::temp_dir().join("contentflow-audio")
}

fn default_user_agent() -> String {
    format!("contentflow/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_llm_provider: default_llm_provider(),
            llm_timeout_seconds: default_llm_timeout(),
            image_timeout_seconds: default_image_timeout(),
            speech_timeout_seconds: default_speech_timeout(),
            fetch_timeout_seconds: default_fetch_timeout(),
            audio_output_dir: default_audio_output_dir(),
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Creates default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ContentflowError::configuration(format!("invalid settings: {e}")))
    }

    /// Builds settings from `CONTENTFLOW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut settings = Self::default();

        if let Some(provider) = var("DEFAULT_LLM_PROVIDER") {
            settings.default_llm_provider = provider;
        }
        if let Some(value) = var("LLM_TIMEOUT_SECONDS") {
            settings.llm_timeout_seconds = parse_number("LLM_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = var("IMAGE_TIMEOUT_SECONDS") {
            settings.image_timeout_seconds = parse_number("IMAGE_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = var("SPEECH_TIMEOUT_SECONDS") {
            settings.speech_timeout_seconds = parse_number("SPEECH_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = var("FETCH_TIMEOUT_SECONDS") {
            settings.fetch_timeout_seconds = parse_number("FETCH_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(dir) = var("AUDIO_OUTPUT_DIR") {
            settings.audio_output_dir = PathBuf::from(dir);
        }
        if let Some(agent) = var("USER_AGENT") {
            settings.user_agent = agent;
        }
        if let Some(value) = var("RETRY_BASE_DELAY_MS") {
            settings.retry.base_delay_ms = parse_number("RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = var("LOG_FORMAT") {
            settings.log_format = value.parse()?;
        }

        Ok(settings)
    }

    /// Sets the default LLM provider.
    #[must_use]
    pub fn with_default_llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_llm_provider = provider.into();
        self
    }

    /// Sets the audio output directory.
    #[must_use]
    pub fn with_audio_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_output_dir = dir.into();
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Chat-completion timeout.
    #[must_use]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_seconds)
    }

    /// Image-generation timeout.
    #[must_use]
    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_seconds)
    }

    /// Text-to-speech timeout.
    #[must_use]
    pub fn speech_timeout(&self) -> Duration {
        Duration::from_secs(self.speech_timeout_seconds)
    }

    /// Search and fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ContentflowError::configuration(format!(
            "{ENV_PREFIX}{name} must be a number, got '{value}'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_llm_provider, "openai");
        assert_eq!(settings.llm_timeout(), Duration::from_secs(120));
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(settings.retry.max_retries, 3);
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(r#"{"llm_timeout_seconds": 10}"#).unwrap();
        assert_eq!(settings.llm_timeout_seconds, 10);
        assert_eq!(settings.speech_timeout_seconds, 60);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<String, String> = [
            ("CONTENTFLOW_LLM_TIMEOUT_SECONDS", "15"),
            ("CONTENTFLOW_AUDIO_OUTPUT_DIR", "/tmp/audio"),
            ("CONTENTFLOW_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings = Settings::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(settings.llm_timeout_seconds, 15);
        assert_eq!(settings.audio_output_dir, PathBuf::from("/tmp/audio"));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let err = Settings::from_lookup(|k| {
            (k == "CONTENTFLOW_FETCH_TIMEOUT_SECONDS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
